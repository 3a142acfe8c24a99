//! 分片读取
//!
//! 插件不发长度前缀也不发分隔符，只能在每收到一块数据后尝试把累计缓冲解析为 JSON：
//! 解析成功即认为响应完整。对端关闭时缓冲即为最终结果；超时时若缓冲恰好是合法 JSON 也接受。
//! 多个 JSON 值拼接不被接受（解析会因尾部多余字符失败，最终在解码阶段报错）。

use std::time::Duration;

use serde::de::IgnoredAny;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::core::TransportError;

/// 读取参数
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub chunk_size: usize,
    /// 单次 read 的超时
    pub read_timeout: Duration,
    /// 累计字节上限，None 表示不限制
    pub max_bytes: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            read_timeout: Duration::from_secs(5),
            max_bytes: None,
        }
    }
}

/// 判断缓冲是否是一个完整的 JSON 文档（先做 UTF-8 校验，半个多字节字符视为不完整）
pub fn is_complete_json(buf: &[u8]) -> bool {
    match std::str::from_utf8(buf) {
        Ok(text) => serde_json::from_str::<IgnoredAny>(text).is_ok(),
        Err(_) => false,
    }
}

/// 读取一条完整响应的原始字节
pub async fn receive_full_response<R>(
    reader: &mut R,
    opts: &ReadOptions,
) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; opts.chunk_size.max(1)];

    loop {
        let n = match timeout(opts.read_timeout, reader.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::error!("Error during receive: {}", e);
                return Err(TransportError::Receive(e));
            }
            Err(_) => {
                tracing::warn!("Socket timeout during receive");
                if !buf.is_empty() && is_complete_json(&buf) {
                    tracing::info!("Using partial response after timeout ({} bytes)", buf.len());
                    return Ok(buf);
                }
                return Err(TransportError::ReceiveTimeout);
            }
        };

        if n == 0 {
            if buf.is_empty() {
                return Err(TransportError::ConnectionClosed);
            }
            tracing::debug!("Peer closed connection after {} bytes", buf.len());
            return Ok(buf);
        }

        buf.extend_from_slice(&chunk[..n]);
        if let Some(limit) = opts.max_bytes {
            if buf.len() > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }
        }

        if is_complete_json(&buf) {
            tracing::info!("Received complete response ({} bytes)", buf.len());
            return Ok(buf);
        }
        tracing::debug!("Received partial response, waiting for more data...");
    }
}
