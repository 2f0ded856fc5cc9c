//! # File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0 de archivos estáticos.
//!
//! Uso: `file_server <directorio> <puerto>`
//!
//! Un SIGINT (Ctrl-C) dispara el apagado ordenado: se deja de aceptar,
//! se drena la cola, se espera a todos los workers y se liberan los
//! recursos. Código de salida 0 si el apagado fue limpio, 1 ante
//! cualquier fallo no recuperado.

use file_server::config::Config;
use file_server::server::Server;

fn main() {
    println!("=================================");
    println!("  File Server HTTP/1.0");
    println!("  Principios de Sistemas Operativos");
    println!("=================================\n");

    // Parsear configuración desde CLI y variables de entorno
    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuración inválida: {}", e);
        std::process::exit(1);
    }

    config.print_summary();

    let mut server = Server::new(config);

    // El handler de SIGINT solo dispara la señal de apagado; el
    // acceptor la observa en su loop y es quien ejecuta el protocolo
    let shutdown = server.shutdown_signal();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n🛑 SIGINT recibido, apagando...");
        shutdown.trigger();
    }) {
        eprintln!("💥 No se pudo instalar el handler de SIGINT: {}", e);
        std::process::exit(1);
    }

    // Correr el servidor (esto bloquea hasta el apagado)
    if let Err(e) = server.run() {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}
