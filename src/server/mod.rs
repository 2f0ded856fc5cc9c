//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el núcleo concurrente del servidor:
//!
//! 1. La cola acotada de conexiones (`queue`)
//! 2. El pool fijo de workers (`pool`)
//! 3. La señal de apagado (`signal`)
//! 4. El acceptor TCP y el protocolo de apagado ordenado (`tcp`)
//!
//! El flujo es: el acceptor acepta una conexión → la encola (puede
//! bloquearse si la cola está llena) → un worker la desencola en orden
//! FIFO → el worker la atiende con el handler → el worker la cierra.

pub mod pool;
pub mod queue;
pub mod signal;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use pool::{PoolError, WorkerPool};
pub use queue::{ConnectionQueue, QueueError};
pub use signal::ShutdownSignal;
pub use tcp::{Server, ServerError};
