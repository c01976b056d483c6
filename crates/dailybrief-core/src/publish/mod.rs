mod publisher;
mod xmlrpc;

pub use publisher::{BlogPublisher, PublishOutcome};
pub use xmlrpc::{parse_new_post_response, new_post_request, NewPost, RpcResponse};
