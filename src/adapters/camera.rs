//! LAN camera adapter.
//!
//! Implements [`CapturePort`].  The camera node serves its latest frame at
//! `http://<ip>/jpg`, so "capturing" hands back that locator and the relay
//! fetches it.  Mock mode returns a placeholder public image wrapped in the
//! same JSON document the structured camera firmware answers with.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{CapturePort, HttpPort};
use crate::config::SystemConfig;

pub struct CameraAdapter {
    capture_url: String,
    mock_mode: bool,
    ip: String,
    port: u16,
    check_timeout_ms: u64,
    mock_counter: u32,
}

impl CameraAdapter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            capture_url: config.camera_capture_url(),
            mock_mode: config.camera.mock_mode,
            ip: config.camera.ip.clone(),
            port: config.camera.port,
            check_timeout_ms: config.camera.check_timeout_ms,
            mock_counter: 0,
        }
    }

    /// TCP connect, then any HTTP answer from `/`.
    pub fn check_connection(&self, http: &mut impl HttpPort) -> bool {
        if self.mock_mode {
            info!("Camera: mock mode, skipping connection check");
            return true;
        }
        let addr: SocketAddr = match format!("{}:{}", self.ip, self.port).parse() {
            Ok(a) => a,
            Err(_) => {
                warn!("Camera: '{}' is not an IP address", self.ip);
                return false;
            }
        };
        let timeout = Duration::from_millis(self.check_timeout_ms);
        if let Err(e) = TcpStream::connect_timeout(&addr, timeout) {
            warn!("Camera: TCP connect to {} failed: {}", addr, e);
            return false;
        }
        let root = format!("http://{}:{}/", self.ip, self.port);
        match http.get_status(&root, self.check_timeout_ms) {
            Ok(code) => {
                info!("Camera: online at {} (HTTP {})", addr, code);
                true
            }
            Err(e) => {
                warn!("Camera: HTTP check failed: {}", e);
                false
            }
        }
    }
}

impl CapturePort for CameraAdapter {
    fn capture(&mut self) -> Option<String> {
        if self.mock_mode {
            self.mock_counter = self.mock_counter.wrapping_add(1);
            return Some(format!(
                "{{\"url\":\"https://picsum.photos/640/480?random={}\"}}",
                self.mock_counter
            ));
        }
        Some(self.capture_url.clone())
    }
}
