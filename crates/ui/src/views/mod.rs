mod home;
mod results;
mod session;
mod state;

pub use home::HomeView;
pub use results::ResultsView;
pub use session::SessionView;
pub use state::{ViewError, ViewState, view_state_from_resource};

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;
