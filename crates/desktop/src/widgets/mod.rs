pub mod file_row;
pub mod primary_button;
pub mod secondary_button;
