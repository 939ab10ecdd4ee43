use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

/// 活动扫描连接监视器
///
/// 每个扫描开始时登记一个令牌，结束时注销，用来观察当前有多少扫描在运行。
#[derive(Debug, Clone, Default)]
pub struct ConnectionMonitor {
    inner: Arc<MonitorInner>,
}

#[derive(Debug, Default)]
struct MonitorInner {
    next_id: AtomicU64,
    active: Mutex<HashSet<u64>>,
}

/// 监视令牌，drop 时自动注销
#[derive(Debug)]
pub struct MonitorToken {
    id: u64,
    monitor: ConnectionMonitor,
}

impl MonitorToken {
    /// 登记编号
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for MonitorToken {
    fn drop(&mut self) {
        self.monitor.stop(self.id);
    }
}

impl ConnectionMonitor {
    /// 空的监视器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个扫描，返回令牌
    pub fn start(&self) -> MonitorToken {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let active = {
            let mut set = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            set.insert(id);
            set.len()
        };
        debug!("connection monitor: start #{} ({} active)", id, active);
        MonitorToken {
            id,
            monitor: self.clone(),
        }
    }

    fn stop(&self, id: u64) {
        let active = {
            let mut set = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            set.remove(&id);
            set.len()
        };
        debug!("connection monitor: stop #{} ({} active)", id, active);
    }

    /// 当前活动扫描数
    pub fn active(&self) -> usize {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_track_active_scans() {
        let monitor = ConnectionMonitor::new();
        let a = monitor.start();
        let b = monitor.start();
        assert_ne!(a.id(), b.id());
        assert_eq!(monitor.active(), 2);
        drop(a);
        assert_eq!(monitor.active(), 1);
        drop(b);
        assert_eq!(monitor.active(), 0);
    }
}
