//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor de archivos con
//! soporte para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server ./public 8080 \
//!   --workers 5 \
//!   --queue-capacity 5
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_HOST=0.0.0.0 WORKERS=8 ./file_server ./public 8080
//! ```

use clap::Parser;
use std::path::Path;

/// Configuración del servidor HTTP/1.0 de archivos estáticos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos para Principios de Sistemas Operativos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Directorio raíz desde el que se sirven los archivos
    #[arg(env = "SERVE_DIR")]
    pub directory: String,

    /// Puerto TCP en el que escucha el servidor
    #[arg(env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    // === Concurrencia ===

    /// Número de workers que atienden conexiones
    #[arg(long, default_value = "5", env = "WORKERS")]
    pub workers: usize,

    /// Capacidad de la cola de conexiones pendientes
    #[arg(long = "queue-capacity", default_value = "5", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }

        if !Path::new(&self.directory).is_dir() {
            return Err(format!(
                "Serve directory does not exist: {}",
                self.directory
            ));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════╗");
        println!("║        File Server - Configuración           ║");
        println!("╚══════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:        {}", self.address());
        println!("   Serve dir:      {}", self.directory);
        println!();
        println!("👷 Concurrencia:");
        println!("   Workers:        {}", self.workers);
        println!("   Queue capacity: {}", self.queue_capacity);
        println!();
        println!("════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            directory: "./public".to_string(),
            port: 8080,
            host: "0.0.0.0".to_string(),
            workers: 5,
            queue_capacity: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Config de prueba apuntando a un directorio que existe seguro
    fn valid_config() -> Config {
        Config {
            directory: std::env::temp_dir().to_string_lossy().to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.workers, 5);
        assert_eq!(config.queue_capacity, 5);
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_success() {
        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = valid_config();
        config.workers = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_invalid_queue_capacity() {
        let mut config = valid_config();
        config.queue_capacity = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Queue capacity"));
    }

    #[test]
    fn test_validate_missing_directory() {
        let mut config = valid_config();
        config.directory = "/no/existe/en/ningun/lado".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("does not exist"));
    }

    #[test]
    fn test_config_print_summary() {
        let config = Config::default();
        // Should not panic
        config.print_summary();
    }
}
