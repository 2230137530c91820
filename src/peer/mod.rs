pub mod actor;
pub mod link;

pub use actor::{GetView, PeerActor, PeerCommand, RemoteFrame, TakeNotices};
pub use link::{Disconnected, PeerLink, RecipientLink};
