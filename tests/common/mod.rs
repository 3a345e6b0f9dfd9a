#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use unified_ai::{Error, TextGenerator};

/// Offline generator that replays canned replies in order and
/// remembers what it was asked
pub struct ScriptedGenerator
{   replies: Mutex<VecDeque<Result<String, Error>>>
  , pub calls: Mutex<Vec<(String, String)>>
}

impl ScriptedGenerator
{   pub fn new(replies: Vec<Result<String, Error>>) -> Self
    {   ScriptedGenerator
        {   replies: Mutex::new(replies.into())
          , calls: Mutex::new(vec![])
        }
    }

    pub fn text(reply: &str) -> Self
    {   ScriptedGenerator::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(error: Error) -> Self
    {   ScriptedGenerator::new(vec![Err(error)])
    }

    pub fn calls(&self) -> Vec<(String, String)>
    {   self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator
{   async fn generate_text(
      &self
    , prompt: &str
    , model: &str
    ) -> Result<String, Error>
    {   self.calls.lock().unwrap()
          .push((prompt.to_string(), model.to_string()));
        self.replies.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| Err(Error::Other("script exhausted".to_string())))
    }
}

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// One scripted HTTP reply from the local test server
#[derive(Debug, Clone)]
pub struct CannedResponse
{   pub status: u16
  , pub body: String
  , pub delay: std::time::Duration
}

impl CannedResponse
{   pub fn status(status: u16, body: &str) -> Self
    {   CannedResponse
        {   status
          , body: body.to_string()
          , delay: std::time::Duration::ZERO
        }
    }

    /// A 200 chat completion whose first choice carries `content`
    pub fn chat(content: &str) -> Self
    {   let body = serde_json::json!({
          "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
          }]
        });
        CannedResponse::status(200, &body.to_string())
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self
    {   self.delay = delay;
        self
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream)
{   use tokio::io::AsyncReadExt;
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop
    {   let n = match socket.read(&mut chunk).await
        {   Ok(0) | Err(_) => return
          , Ok(n) => n
        };
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n")
        {   let content_length = text[..head_end]
              .lines()
              .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim().eq_ignore_ascii_case("content-length")
                  .then(|| value.trim().parse::<usize>().ok())
                  .flatten()
              })
              .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length
            {   return;
            }
        }
    }
}

/// Serve `script` one reply per connection (the last reply repeats).
/// Returns the base URL and a counter of requests served.
pub async fn spawn_server(
  script: Vec<CannedResponse>
) -> (String, std::sync::Arc<std::sync::atomic::AtomicUsize>)
{   use std::sync::atomic::Ordering;
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
      loop
      {   let (mut socket, _) = match listener.accept().await
          {   Ok(conn) => conn
            , Err(_) => break
          };
          let n = counter.fetch_add(1, Ordering::SeqCst);
          let canned = script[n.min(script.len() - 1)].clone();
          tokio::spawn(async move {
            read_request(&mut socket).await;
            tokio::time::sleep(canned.delay).await;
            let reply = format!(
              "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\n\
               Content-Length: {}\r\nConnection: close\r\n\r\n{}",
              canned.status, canned.body.len(), canned.body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
          });
      }
    });

    (format!("http://{}", addr), hits)
}
