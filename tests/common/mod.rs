//! Common test utilities shared by the integration tests.
//!
//! - [`transport`]: scripted, recording [`Transport`] for pipeline tests
//! - [`images`]: encoded image fixtures
//! - [`stub_server`]: one-shot HTTP server for exercising the real reqwest path
//!
//! [`Transport`]: workplace_rca::llm::Transport

#![allow(dead_code)]

pub mod transport {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use workplace_rca::RcaResult;
    use workplace_rca::llm::{HttpReply, Transport};

    #[derive(Debug, Clone)]
    pub enum RecordedCall {
        Json {
            url: String,
            bearer: String,
            body: serde_json::Value,
        },
        Text {
            url: String,
            body: String,
        },
    }

    /// Chat replies are served from a queue; renders always get the same reply.
    pub struct RecordingTransport {
        chat_replies: Mutex<VecDeque<HttpReply>>,
        render_reply: Mutex<HttpReply>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl RecordingTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                chat_replies: Mutex::new(VecDeque::new()),
                render_reply: Mutex::new(HttpReply::new(200, super::images::PNG_STUB.to_vec())),
                calls: Mutex::new(Vec::new()),
            })
        }

        /// Queue a successful chat completion with `content`.
        pub fn push_chat_content(&self, content: &str) {
            let body = serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
            });
            self.push_chat_reply(HttpReply::new(200, body.to_string()));
        }

        pub fn push_chat_reply(&self, reply: HttpReply) {
            self.chat_replies.lock().unwrap().push_back(reply);
        }

        pub fn set_render_reply(&self, reply: HttpReply) {
            *self.render_reply.lock().unwrap() = reply;
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn chat_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, RecordedCall::Json { .. }))
                .count()
        }

        pub fn render_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, RecordedCall::Text { .. }))
                .count()
        }

        /// Text of the single user message of chat call `index`.
        pub fn chat_prompt(&self, index: usize) -> String {
            let calls = self.calls();
            let body = calls
                .iter()
                .filter_map(|c| match c {
                    RecordedCall::Json { body, .. } => Some(body),
                    RecordedCall::Text { .. } => None,
                })
                .nth(index)
                .expect("no such chat call");
            match &body["messages"][0]["content"] {
                serde_json::Value::String(text) => text.clone(),
                parts => parts[0]["text"].as_str().unwrap_or_default().to_string(),
            }
        }
    }

    impl Transport for RecordingTransport {
        fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> RcaResult<HttpReply> {
            self.calls.lock().unwrap().push(RecordedCall::Json {
                url: url.to_string(),
                bearer: bearer.to_string(),
                body: body.clone(),
            });
            Ok(self
                .chat_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| HttpReply::new(500, "no scripted reply")))
        }

        fn post_text(&self, url: &str, body: &str) -> RcaResult<HttpReply> {
            self.calls.lock().unwrap().push(RecordedCall::Text {
                url: url.to_string(),
                body: body.to_string(),
            });
            Ok(self.render_reply.lock().unwrap().clone())
        }
    }
}

pub mod images {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    /// Bytes standing in for a rendered PNG; never decoded.
    pub const PNG_STUB: &[u8] = b"\x89PNG\r\n\x1a\nstub";

    /// Gradient image so resizing has something to interpolate.
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        gradient(width, height)
            .write_to(&mut out, format)
            .expect("fixture encodes");
        out.into_inner()
    }

    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Jpeg)
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Png)
    }
}

pub mod stub_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// What the stub received.
    #[derive(Debug)]
    pub struct CapturedRequest {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl CapturedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Serve exactly one request with `status` and `body`, then stop.
    ///
    /// Returns the base URL (`http://127.0.0.1:<port>`) and a handle yielding
    /// the captured request.
    pub fn serve_once(status: u16, body: Vec<u8>) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let captured = read_request(&mut stream);

            let head = format!(
                "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).expect("write head");
            stream.write_all(&body).expect("write body");
            stream.flush().expect("flush");
            captured
        });

        (url, handle)
    }

    fn read_request(stream: &mut impl Read) -> CapturedRequest {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut chunk).expect("read request");
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buf[header_end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).expect("read body");
            assert!(n > 0, "connection closed before body was complete");
            body.extend_from_slice(&chunk[..n]);
        }

        CapturedRequest {
            request_line,
            headers,
            body,
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}

pub mod fixtures {
    use std::path::Path;

    use workplace_rca::RcaConfig;

    pub const MINDMAP: &str = "@startmindmap
* Root Cause Analysis
**[#FF0000] Critical Issues
*** Problem: Blocked emergency exit
*** Root Cause: No storage area for incoming pallets
**[#0000FF] Monitoring Areas
*** Watch For: Pallets returning to the corridor
@endmindmap";

    pub const WBS: &str = "@startwbs
* Root Cause Resolution Project
**[#FF0000] Phase 1: Critical Issues (Immediate)
*** Clear emergency exit
**[#FFA500] Phase 2: High Priority Fixes (Week 1-2)
*** Designate pallet staging area
@endwbs";

    pub const ANALYSIS: &str = "Critical: the emergency exit is blocked by pallets.\nHigh: no marked staging area.";

    /// Default configuration writing into `dir`.
    pub fn config_in(dir: &Path) -> RcaConfig {
        RcaConfig {
            output_dir: dir.to_path_buf(),
            ..RcaConfig::default()
        }
    }
}
