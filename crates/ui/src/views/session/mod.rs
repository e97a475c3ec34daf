mod panels;
mod view;

pub use view::SessionView;
