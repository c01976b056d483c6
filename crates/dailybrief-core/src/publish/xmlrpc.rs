use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::{Error, Result};

/// Payload of a metaWeblog.newPost call
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub date_created: DateTime<Utc>,
}

/// Parsed metaWeblog.newPost response.
///
/// `Truncated` carries a post id that surfaced before the document became
/// unparseable: the remote side has most likely committed the post even
/// though its response was malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Success { post_id: String },
    Fault { code: i32, message: String },
    Truncated { post_id: String, detail: String },
}

/// Serialize a metaWeblog.newPost method call.
///
/// Parameter order is fixed by the protocol: blog id (unused, empty),
/// username, password, post struct, publish flag.
pub fn new_post_request(username: &str, password: &str, post: &NewPost) -> String {
    let categories = post
        .categories
        .iter()
        .map(|c| format!("<value><string>{}</string></value>", escape(c)))
        .collect::<String>();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<methodCall>
  <methodName>metaWeblog.newPost</methodName>
  <params>
    <param><value><string></string></value></param>
    <param><value><string>{username}</string></value></param>
    <param><value><string>{password}</string></value></param>
    <param><value><struct>
      <member><name>title</name><value><string>{title}</string></value></member>
      <member><name>description</name><value><string>{description}</string></value></member>
      <member><name>categories</name><value><array><data>{categories}</data></array></value></member>
      <member><name>dateCreated</name><value><dateTime.iso8601>{date}</dateTime.iso8601></value></member>
    </struct></value></param>
    <param><value><boolean>1</boolean></value></param>
  </params>
</methodCall>"#,
        username = escape(username),
        password = escape(password),
        title = escape(&post.title),
        description = escape(&post.description),
        categories = categories,
        date = post.date_created.format("%Y%m%dT%H:%M:%S"),
    )
}

/// Parse a metaWeblog.newPost response.
///
/// The happy path is a single scalar value (the post id). A `<fault>`
/// carries faultCode/faultString members. When the document errors out
/// after a post id was already seen, the id is preserved in `Truncated`
/// instead of being discarded.
pub fn parse_new_post_response(xml: &str) -> Result<RpcResponse> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    let mut in_name = false;
    let mut member_name = String::new();
    let mut fault_code: Option<i32> = None;
    let mut fault_string: Option<String> = None;
    let mut post_id: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"fault" => in_fault = true,
                b"name" => in_name = true,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.trim().to_string(),
                    Err(e) => return recover(post_id, &e.to_string()),
                };
                if text.is_empty() {
                    continue;
                }

                if in_name {
                    member_name = text;
                    in_name = false;
                } else if in_fault {
                    match member_name.as_str() {
                        "faultCode" => fault_code = text.parse().ok(),
                        "faultString" => fault_string = Some(text),
                        _ => {}
                    }
                } else if post_id.is_none() {
                    post_id = Some(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return recover(post_id, &e.to_string()),
            _ => {}
        }
    }

    if in_fault || fault_string.is_some() {
        return Ok(RpcResponse::Fault {
            code: fault_code.unwrap_or(0),
            message: fault_string.unwrap_or_else(|| "unknown fault".to_string()),
        });
    }

    match post_id {
        Some(post_id) if !post_id.is_empty() => Ok(RpcResponse::Success { post_id }),
        _ => Err(Error::XmlRpc("response carried no post id".to_string())),
    }
}

fn recover(post_id: Option<String>, detail: &str) -> Result<RpcResponse> {
    match post_id {
        Some(post_id) if !post_id.is_empty() => Ok(RpcResponse::Truncated {
            post_id,
            detail: detail.to_string(),
        }),
        _ => Err(Error::XmlRpc(detail.to_string())),
    }
}
