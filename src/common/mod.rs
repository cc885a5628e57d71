mod state;
pub mod values;

pub use state::AppState;
