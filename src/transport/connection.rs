//! 与 Unreal 编辑器插件的连接
//!
//! 插件在每次交换后主动关闭自己这一端，所以每条命令都走完整的
//! 连接 → 发送 → 接收 → 断开 周期；这是协议事实，不能改成长连接复用。
//! `send_command` 返回后连接一定处于断开状态。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::EngineSection;
use crate::core::TransportError;
use crate::transport::framing::{receive_full_response, ReadOptions};
use crate::transport::{Command, Response};

/// 连接参数
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// 单次 send / recv 的超时
    pub io_timeout: Duration,
    pub chunk_size: usize,
    pub socket_buffer_bytes: u32,
    pub max_response_bytes: Option<usize>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from(&EngineSection::default())
    }
}

impl From<&EngineSection> for ConnectionOptions {
    fn from(section: &EngineSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            connect_timeout: Duration::from_secs(section.connect_timeout_secs),
            io_timeout: Duration::from_secs(section.read_timeout_secs),
            chunk_size: section.chunk_size,
            socket_buffer_bytes: section.socket_buffer_bytes,
            max_response_bytes: (section.max_response_bytes > 0)
                .then_some(section.max_response_bytes),
        }
    }
}

impl ConnectionOptions {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            chunk_size: self.chunk_size,
            read_timeout: self.io_timeout,
            max_bytes: self.max_response_bytes,
        }
    }
}

/// 单个连接对象；socket 为 Some 即已连接
pub struct EngineConnection {
    options: ConnectionOptions,
    socket: Option<TcpStream>,
}

impl EngineConnection {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            socket: None,
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// 关闭旧 socket 后重新连接；失败只记日志并返回 false
    pub async fn connect(&mut self) -> bool {
        self.disconnect();
        tracing::info!("Connecting to Unreal at {}...", self.options.address());
        match self.open().await {
            Ok(stream) => {
                self.socket = Some(stream);
                tracing::info!("Connected to Unreal Engine");
                true
            }
            Err(e) => {
                tracing::error!("Failed to connect to Unreal: {}", e);
                false
            }
        }
    }

    /// 幂等：有 socket 就丢弃（关闭），没有则什么都不做
    pub fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!("Disconnected from Unreal Engine");
        }
    }

    /// 为这一条命令执行完整的连接/发送/接收/断开周期
    ///
    /// 仅当连接这一步失败时返回 None；之后的任何失败都会变成 status=error 的 Response。
    pub async fn send_command(
        &mut self,
        name: &str,
        params: Option<Map<String, Value>>,
    ) -> Option<Response> {
        let command = match Command::new(name, params) {
            Ok(command) => command,
            Err(e) => {
                tracing::error!("Error sending command: {}", e);
                return Some(Response::error(e.to_string()));
            }
        };

        // 插件每次交换后都会关闭，先丢掉可能残留的旧连接
        self.disconnect();
        if !self.connect().await {
            tracing::error!("Failed to connect to Unreal Engine for command");
            return None;
        }

        let result = self.exchange(&command).await;
        self.disconnect();

        Some(match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error sending command: {}", e);
                Response::error(e.to_string())
            }
        })
    }

    async fn exchange(&mut self, command: &Command) -> Result<Response, TransportError> {
        let payload = command.to_json()?;
        let io_timeout = self.options.io_timeout;
        let read_opts = self.options.read_options();
        // 取出 socket：调用方超时丢弃这个 future 时，连接随局部变量一起关闭
        let mut stream = self.socket.take().ok_or(TransportError::NotConnected)?;

        tracing::info!("Sending command: {}", payload);
        timeout(io_timeout, stream.write_all(payload.as_bytes()))
            .await
            .map_err(|_| TransportError::SendTimeout)?
            .map_err(TransportError::Send)?;

        let data = receive_full_response(&mut stream, &read_opts).await?;
        let text = String::from_utf8(data).map_err(|e| TransportError::Decode(e.to_string()))?;
        let raw: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;
        tracing::info!("Complete response from Unreal: {}", raw);

        Ok(Response::normalize(raw))
    }

    async fn open(&self) -> Result<TcpStream, TransportError> {
        let address = self.options.address();
        let addr: SocketAddr = lookup_host((self.options.host.as_str(), self.options.port))
            .await
            .map_err(|e| TransportError::Resolve(format!("{}: {}", address, e)))?
            .next()
            .ok_or_else(|| TransportError::Resolve(address.clone()))?;

        let connect_err = |source| TransportError::Connect {
            addr: address.clone(),
            source,
        };
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(connect_err)?;
        socket.set_keepalive(true).map_err(connect_err)?;
        socket
            .set_recv_buffer_size(self.options.socket_buffer_bytes)
            .map_err(connect_err)?;
        socket
            .set_send_buffer_size(self.options.socket_buffer_bytes)
            .map_err(connect_err)?;

        let stream = timeout(self.options.connect_timeout, socket.connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout(address.clone()))?
            .map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        Ok(stream)
    }
}

/// 会话级句柄：同一会话的所有工具共享一个连接对象，异步互斥保证同一时刻只有一条命令在途
///
/// 需要真正并发时，为每条在途命令各建一个 EngineClient。
#[derive(Clone)]
pub struct EngineClient {
    inner: Arc<Mutex<EngineConnection>>,
}

impl EngineClient {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineConnection::new(options))),
        }
    }

    pub fn from_config(section: &EngineSection) -> Self {
        Self::new(ConnectionOptions::from(section))
    }

    pub async fn send_command(
        &self,
        name: &str,
        params: Option<Map<String, Value>>,
    ) -> Option<Response> {
        self.inner.lock().await.send_command(name, params).await
    }

    /// 连一下再断开，用于启动时探测插件是否在线
    pub async fn probe(&self) -> bool {
        let mut conn = self.inner.lock().await;
        let ok = conn.connect().await;
        conn.disconnect();
        ok
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.is_connected()
    }

    pub async fn disconnect(&self) {
        self.inner.lock().await.disconnect();
    }
}
