pub mod bars;
pub mod path_prompt;
pub mod progress_bar;
pub mod scrollable_list;
pub mod status_bar;
pub mod toast;
