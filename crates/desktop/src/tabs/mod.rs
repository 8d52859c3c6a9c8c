pub mod about_tab;
pub mod appearance_tab;
pub mod batch_tab;
pub mod frames_tab;
pub mod settings_tab;
