mod cli_test;
mod parser_test;
mod pipeline_test;
