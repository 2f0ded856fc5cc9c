//! # File Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos implementado desde cero para
//! demostrar conceptos de sistemas operativos: concurrencia,
//! sincronización y apagado ordenado de recursos.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing y manejo del protocolo HTTP/1.0
//! - `config`: Configuración por CLI y variables de entorno
//! - `server`: Acceptor TCP, cola de conexiones, pool de workers y apagado
//! - `handler`: Atención de una conexión (request → archivo → response)
//! - `metrics`: Recolección de métricas y observabilidad
//!
//! ## Ejemplo de uso
//!
//! ```ignore
//! use file_server::server::Server;
//! use file_server::config::Config;
//!
//! let mut server = Server::new(Config::default());
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod http;
pub mod config;
pub mod server;
pub mod handler;
pub mod metrics;
