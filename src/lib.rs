pub mod app;
pub mod config;
pub mod errors;
pub mod game;
pub mod handlers;
pub mod models;
pub mod recorder;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod transport;
pub mod tricks;
pub mod ui;

pub use app::router;
pub use recorder::{AttemptRecorder, ElementDescriptor, Page, TrickId};
pub use state::AppState;
pub use storage::load_data;
pub use transport::{HttpTransport, Transport};
