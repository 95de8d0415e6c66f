pub mod header;
pub mod help_overlay;
pub mod playlist_picker;
pub mod seek_bar;
