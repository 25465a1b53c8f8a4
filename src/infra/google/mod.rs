// Google REST adapters: the OAuth token endpoint and the Classroom API.

pub mod classroom_client;
pub mod oauth_client;

pub use classroom_client::ClassroomClient;
pub use oauth_client::GoogleTokenClient;
