pub mod channel_list;
pub mod help_overlay;
pub mod log_panel;
pub mod player_panel;
pub mod update_prompt;
