pub mod deface_anonymizer;
mod deface_args;
mod deface_output;
