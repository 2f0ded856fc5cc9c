//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Máximo de latencias a guardar para el promedio
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Collector de métricas thread-safe
pub struct MetricsCollector {
    inner: Mutex<MetricsData>,
    start_time: Instant,
}

/// Datos internos de métricas
struct MetricsData {
    /// Contador total de requests atendidos
    total_requests: u64,

    /// Requests por código de estado
    status_codes: HashMap<u16, u64>,

    /// Bytes de cuerpo enviados
    bytes_sent: u64,

    /// Latencias registradas (en microsegundos)
    latencies_us: Vec<u64>,

    /// Conexiones que fallaron con error de E/S
    io_errors: u64,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsData {
                total_requests: 0,
                status_codes: HashMap::new(),
                bytes_sent: 0,
                latencies_us: Vec::with_capacity(MAX_LATENCY_SAMPLES),
                io_errors: 0,
            }),
            start_time: Instant::now(),
        }
    }

    /// Registra un request atendido
    pub fn record_request(&self, status_code: u16, bytes_sent: u64, latency: Duration) {
        let mut data = self.inner.lock().unwrap();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;
        data.bytes_sent += bytes_sent;

        // Si tenemos demasiadas latencias, eliminar la más antigua
        if data.latencies_us.len() >= MAX_LATENCY_SAMPLES {
            data.latencies_us.remove(0);
        }
        data.latencies_us.push(latency.as_micros() as u64);
    }

    /// Registra una conexión caída por error de E/S
    pub fn record_io_error(&self) {
        let mut data = self.inner.lock().unwrap();
        data.io_errors += 1;
    }

    /// Obtiene el total de requests atendidos
    pub fn total_requests(&self) -> u64 {
        let data = self.inner.lock().unwrap();
        data.total_requests
    }

    /// Obtiene las métricas actuales como JSON
    pub fn summary_json(&self) -> serde_json::Value {
        let data = self.inner.lock().unwrap();

        let avg_latency_ms = if data.latencies_us.is_empty() {
            0.0
        } else {
            let total: u64 = data.latencies_us.iter().sum();
            (total as f64 / data.latencies_us.len() as f64) / 1000.0
        };

        let status_codes: HashMap<String, u64> = data
            .status_codes
            .iter()
            .map(|(code, count)| (code.to_string(), *count))
            .collect();

        serde_json::json!({
            "uptime_secs": self.start_time.elapsed().as_secs(),
            "total_requests": data.total_requests,
            "status_codes": status_codes,
            "bytes_sent": data.bytes_sent,
            "avg_latency_ms": avg_latency_ms,
            "io_errors": data.io_errors,
        })
    }

    /// Imprime el resumen final de métricas
    pub fn print_summary(&self) {
        println!("📊 Resumen del servidor:");
        println!("{:#}", self.summary_json());
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.total_requests(), 0);

        let summary = metrics.summary_json();
        assert_eq!(summary["total_requests"], 0);
        assert_eq!(summary["bytes_sent"], 0);
        assert_eq!(summary["io_errors"], 0);
    }

    #[test]
    fn test_record_request_accumulates() {
        let metrics = MetricsCollector::new();
        metrics.record_request(200, 100, Duration::from_millis(2));
        metrics.record_request(200, 50, Duration::from_millis(4));
        metrics.record_request(404, 0, Duration::from_millis(1));

        assert_eq!(metrics.total_requests(), 3);

        let summary = metrics.summary_json();
        assert_eq!(summary["bytes_sent"], 150);
        assert_eq!(summary["status_codes"]["200"], 2);
        assert_eq!(summary["status_codes"]["404"], 1);
    }

    #[test]
    fn test_record_io_error() {
        let metrics = MetricsCollector::new();
        metrics.record_io_error();
        metrics.record_io_error();

        let summary = metrics.summary_json();
        assert_eq!(summary["io_errors"], 2);
        assert_eq!(summary["total_requests"], 0);
    }

    #[test]
    fn test_avg_latency() {
        let metrics = MetricsCollector::new();
        metrics.record_request(200, 0, Duration::from_millis(10));
        metrics.record_request(200, 0, Duration::from_millis(20));

        let summary = metrics.summary_json();
        let avg = summary["avg_latency_ms"].as_f64().unwrap();
        assert!((avg - 15.0).abs() < 0.5);
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        let metrics = MetricsCollector::new();
        metrics.record_request(200, 10, Duration::from_millis(1));
        // Should not panic
        metrics.print_summary();
    }
}
