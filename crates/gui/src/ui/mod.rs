pub mod parameters;
pub mod report_panel;
pub mod sketch_panel;
pub mod source_panel;
pub mod status_bar;
pub mod viewport_panel;
