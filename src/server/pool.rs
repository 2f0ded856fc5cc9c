//! # Pool de Workers
//! src/server/pool.rs
//!
//! Conjunto fijo de threads consumidores de la cola de conexiones. Cada
//! worker repite el mismo ciclo: desencolar un handle, entregárselo a la
//! función de trabajo y soltarlo (lo que cierra la conexión), hasta que
//! la cola le informe el apagado.
//!
//! Los workers no se comunican entre sí: la cola es su único punto de
//! contacto. Un fallo del handler es local a esa conexión; el worker
//! sigue con la próxima.

use crate::server::queue::{ConnectionQueue, QueueError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Fallos acumulados al joinear el pool
///
/// El join intenta esperar a TODOS los workers aunque alguno falle; acá
/// se juntan los que terminaron con error o con panic.
#[derive(Debug)]
pub struct PoolError {
    /// Descripción de cada worker que no terminó limpio
    pub failures: Vec<String>,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} worker(s) failed: {}",
            self.failures.len(),
            self.failures.join("; ")
        )
    }
}

impl std::error::Error for PoolError {}

/// Un worker del pool: su nombre y el handle del thread
struct Worker {
    name: String,
    handle: JoinHandle<Result<(), QueueError>>,
}

/// Pool de N workers de vida larga, todos atados a la misma cola
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Lanza `count` workers consumiendo de `queue`
    ///
    /// La función `work` recibe cada handle desencolado por valor; al
    /// retornar, el handle se suelta y con eso la conexión queda cerrada,
    /// haya fallado o no el procesamiento.
    pub fn spawn<T, F>(count: usize, queue: &Arc<ConnectionQueue<T>>, work: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let mut workers = Vec::with_capacity(count);

        for i in 0..count {
            let name = format!("worker-{}", i);
            let queue = Arc::clone(queue);
            let work = Arc::clone(&work);
            let loop_name = name.clone();

            let handle = thread::spawn(move || Self::worker_loop(&loop_name, &queue, work.as_ref()));

            workers.push(Worker { name, handle });
        }

        Self { workers }
    }

    /// Loop principal del worker
    fn worker_loop<T, F>(name: &str, queue: &ConnectionQueue<T>, work: &F) -> Result<(), QueueError>
    where
        F: Fn(T),
    {
        println!("🔧 Worker {} iniciado", name);

        loop {
            match queue.dequeue() {
                Ok(connection) => {
                    // El handle entra por valor y muere al final del
                    // llamado: la conexión se cierra incondicionalmente
                    work(connection);
                }
                Err(QueueError::Shutdown) => {
                    println!("🛑 Worker {} detenido", name);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Retorna la cantidad de workers del pool
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Verifica si el pool está vacío
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Espera a que todos los workers terminen
    ///
    /// Intenta el join de cada worker aunque alguno haya fallado; los
    /// fallos (errores de cola o panics) se acumulan en el resultado en
    /// vez de cortar en el primero.
    pub fn join_all(self) -> Result<(), PoolError> {
        let mut failures = Vec::new();

        for worker in self.workers {
            match worker.handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(format!("{}: {}", worker.name, err)),
                Err(_) => failures.push(format!("{}: thread panicked", worker.name)),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_pool_processes_every_handle_once() {
        // N=3 workers y M=10 handles: cada handle llega a exactamente
        // una invocación del trabajo, sin importar el scheduling
        let queue = Arc::new(ConnectionQueue::new(10));
        let processed = Arc::new(Mutex::new(Vec::new()));

        let pool = WorkerPool::spawn(3, &queue, {
            let processed = Arc::clone(&processed);
            move |n: u32| {
                processed.lock().unwrap().push(n);
            }
        });
        assert_eq!(pool.len(), 3);

        for n in 0..10 {
            queue.enqueue(n).unwrap();
        }

        queue.shutdown().unwrap();
        pool.join_all().unwrap();

        let mut seen = processed.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_work_failure_is_local_to_the_connection() {
        // El "fallo" del handler (acá, ignorar los impares) no afecta a
        // la cola ni al resto de las conexiones
        let queue = Arc::new(ConnectionQueue::new(10));
        let successes = Arc::new(Mutex::new(0u32));

        let pool = WorkerPool::spawn(2, &queue, {
            let successes = Arc::clone(&successes);
            move |n: u32| {
                if n % 2 == 0 {
                    *successes.lock().unwrap() += 1;
                }
                // Los impares "fallan": el worker simplemente sigue
            }
        });

        for n in 0..10 {
            queue.enqueue(n).unwrap();
        }

        queue.shutdown().unwrap();
        pool.join_all().unwrap();

        assert_eq!(*successes.lock().unwrap(), 5);
    }

    #[test]
    fn test_workers_drain_pending_work_after_shutdown() {
        let queue = Arc::new(ConnectionQueue::new(5));
        for n in 0..5 {
            queue.enqueue(n).unwrap();
        }

        // Apagar ANTES de lanzar los workers: igual deben drenar todo
        queue.shutdown().unwrap();

        let processed = Arc::new(Mutex::new(Vec::new()));
        let pool = WorkerPool::spawn(3, &queue, {
            let processed = Arc::clone(&processed);
            move |n: u32| {
                processed.lock().unwrap().push(n);
            }
        });

        pool.join_all().unwrap();

        let mut seen = processed.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn test_join_all_reports_panicked_worker_and_joins_the_rest() {
        let queue = Arc::new(ConnectionQueue::new(5));

        let pool = WorkerPool::spawn(3, &queue, |n: u32| {
            if n == 2 {
                panic!("boom");
            }
        });

        for n in 0..5 {
            queue.enqueue(n).unwrap();
        }

        // Dar tiempo a que el handle conflictivo se procese
        std::thread::sleep(Duration::from_millis(200));
        queue.shutdown().unwrap();

        let result = pool.join_all();
        let err = result.expect_err("the panicked worker must be reported");
        assert_eq!(err.failures.len(), 1);
        assert!(err.failures[0].contains("panicked"));
    }

    #[test]
    fn test_idle_pool_joins_cleanly_on_shutdown() {
        let queue: Arc<ConnectionQueue<u32>> = Arc::new(ConnectionQueue::new(3));
        let pool = WorkerPool::spawn(4, &queue, |_n| {});

        queue.shutdown().unwrap();
        pool.join_all().unwrap();
    }
}
