//! 集成测试用的假编辑器插件：每个连接读一条命令、按脚本回写若干分片后关闭

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use unreal_mcp::transport::ConnectionOptions;

/// 对一条请求的回应方式
pub enum Reply {
    /// 依次写出的分片，写完关闭
    Chunks(Vec<Vec<u8>>),
    /// 写出这些字节后保持连接不关，直到测试结束
    Hang(Vec<u8>),
    /// 先写 head，之后每隔 every 写一个空格，永远凑不成完整 JSON；对端关闭后停止
    Trickle { head: Vec<u8>, every: Duration },
    /// 不写任何数据直接关闭
    Close,
}

impl Reply {
    pub fn json(v: &Value) -> Self {
        Reply::Chunks(vec![v.to_string().into_bytes()])
    }

    /// 把 JSON 文本切成 n 段
    pub fn split(v: &Value, n: usize) -> Self {
        let bytes = v.to_string().into_bytes();
        let size = bytes.len().div_ceil(n).max(1);
        Reply::Chunks(bytes.chunks(size).map(|c| c.to_vec()).collect())
    }
}

pub struct StubEngine {
    pub port: u16,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl StubEngine {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    let request = loop {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            return;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        if let Ok(v) = serde_json::from_slice::<Value>(&buf) {
                            break v;
                        }
                    };
                    recorded.lock().unwrap().push(request.clone());

                    match handler(&request) {
                        Reply::Chunks(chunks) => {
                            for c in chunks {
                                let _ = socket.write_all(&c).await;
                                let _ = socket.flush().await;
                                tokio::time::sleep(Duration::from_millis(15)).await;
                            }
                        }
                        Reply::Hang(bytes) => {
                            let _ = socket.write_all(&bytes).await;
                            tokio::time::sleep(Duration::from_secs(30)).await;
                        }
                        Reply::Trickle { head, every } => {
                            if socket.write_all(&head).await.is_err() {
                                return;
                            }
                            for _ in 0..300 {
                                tokio::time::sleep(every).await;
                                if socket.write_all(b" ").await.is_err() {
                                    return;
                                }
                            }
                        }
                        Reply::Close => {}
                    }
                });
            }
        });

        Self { port, requests }
    }

    pub fn options(&self) -> ConnectionOptions {
        ConnectionOptions {
            port: self.port,
            connect_timeout: Duration::from_secs(2),
            io_timeout: Duration::from_secs(2),
            ..ConnectionOptions::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_types(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// 一个当前没有监听者的本地端口
pub fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
