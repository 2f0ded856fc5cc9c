//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del acceptor: el único dueño del socket de escucha.
//! Acepta conexiones y las encola en la `ConnectionQueue`; un pool fijo
//! de workers las desencola y las atiende. Cuando la cola está llena el
//! acceptor se bloquea en el enqueue (backpressure) en vez de descartar
//! conexiones o acumularlas sin límite.
//!
//! El acceptor también es el dueño de la secuencia de apagado, en este
//! orden estricto:
//!
//! 1. dejar de aceptar conexiones
//! 2. señalar el apagado de la cola
//! 3. los threads bloqueados despiertan y drenan lo pendiente
//! 4. esperar (join) a todos los workers
//! 5. liberar la cola
//! 6. cerrar el socket de escucha

use crate::config::Config;
use crate::handler::RequestHandler;
use crate::metrics::MetricsCollector;
use crate::server::pool::{PoolError, WorkerPool};
use crate::server::queue::{ConnectionQueue, QueueError};
use crate::server::signal::ShutdownSignal;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Intervalo entre consultas del flag de apagado cuando no hay
/// conexiones pendientes de aceptar
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errores fatales del servidor
#[derive(Debug)]
pub enum ServerError {
    /// Fallo de E/S al preparar o cerrar el socket de escucha
    Io(io::Error),

    /// Fallo de sincronización en la cola de conexiones
    Queue(QueueError),

    /// Uno o más workers no terminaron limpios
    Workers(PoolError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Io(err) => write!(f, "I/O error: {}", err),
            ServerError::Queue(err) => write!(f, "connection queue error: {}", err),
            ServerError::Workers(err) => write!(f, "worker pool error: {}", err),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        ServerError::Io(err)
    }
}

impl From<QueueError> for ServerError {
    fn from(err: QueueError) -> Self {
        ServerError::Queue(err)
    }
}

/// Servidor HTTP/1.0 de archivos estáticos con pool de workers
pub struct Server {
    config: Config,
    handler: Arc<RequestHandler>,
    metrics: Arc<MetricsCollector>,
    shutdown: ShutdownSignal,
    listener: Option<TcpListener>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let handler = Arc::new(RequestHandler::new(&config.directory));

        Self {
            config,
            handler,
            metrics: Arc::new(MetricsCollector::new()),
            shutdown: ShutdownSignal::new(),
            listener: None,
        }
    }

    /// Obtiene una copia de la señal de apagado del servidor
    ///
    /// El handler de SIGINT y los tests disparan el apagado por acá.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Obtiene el collector de métricas del servidor
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Abre el socket de escucha y retorna la dirección local
    ///
    /// Separado de `run` para que los tests puedan pedir puerto 0
    /// (efímero) y conocer el puerto asignado antes de arrancar.
    pub fn bind(&mut self) -> io::Result<SocketAddr> {
        let address = self.config.address();
        println!("[*] Iniciando servidor en {}", address);

        let listener = TcpListener::bind(&address)?;
        // El accept no bloquea: entre intentos se consulta la señal
        // de apagado
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        println!("[+] Servidor escuchando en {}", local_addr);
        self.listener = Some(listener);

        Ok(local_addr)
    }

    /// Corre el servidor hasta que se dispare la señal de apagado
    ///
    /// Retorna `Ok(())` solo si el apagado completo fue limpio: cola
    /// drenada, todos los workers joineados y recursos liberados.
    pub fn run(&mut self) -> Result<(), ServerError> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                return Err(ServerError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "listener not bound",
                )))
            }
        };

        let queue = Arc::new(ConnectionQueue::new(self.config.queue_capacity));
        println!(
            "[*] Modo concurrente: {} workers, cola de capacidad {}\n",
            self.config.workers, self.config.queue_capacity
        );

        let pool = WorkerPool::spawn(self.config.workers, &queue, {
            let handler = Arc::clone(&self.handler);
            let metrics = Arc::clone(&self.metrics);
            move |stream: TcpStream| {
                Self::serve_connection(stream, &handler, &metrics);
            }
        });

        let mut fatal: Option<QueueError> = None;

        while !self.shutdown.is_triggered() {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    println!("   ✅ Nueva conexión desde: {}", peer_addr);

                    match queue.enqueue(stream) {
                        Ok(()) => {}
                        Err(QueueError::Shutdown) => {
                            // Apagado concurrente: la conexión aceptada
                            // se cierra acá mismo al soltarla, no se
                            // filtra ni se entrega
                            break;
                        }
                        Err(err) => {
                            fatal = Some(err);
                            break;
                        }
                    }
                }
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    eprintln!("   ❌ Error al aceptar conexión: {}", err);
                }
            }
        }

        // === Secuencia de apagado ===
        println!("\n🛑 Iniciando apagado ordenado...");

        // 2. Señalar el apagado de la cola: despierta a todos los
        //    bloqueados; lo pendiente se drena, no se descarta
        if let Err(err) = queue.shutdown() {
            fatal.get_or_insert(err);
        }

        // 4. Esperar a TODOS los workers, acumulando fallos
        let join_result = pool.join_all();

        // 5. Los workers ya soltaron sus referencias: este drop libera
        //    la cola
        drop(queue);

        // 6. Cerrar el socket de escucha
        drop(listener);
        println!("🔒 Socket de escucha cerrado");

        self.metrics.print_summary();

        if let Some(err) = fatal {
            return Err(ServerError::Queue(err));
        }
        join_result.map_err(ServerError::Workers)?;

        println!("👋 Apagado completo");
        Ok(())
    }

    /// Atiende una conexión desde un worker
    ///
    /// Los fallos del handler son locales a esta conexión: se registran
    /// y la conexión se cierra; el worker sigue con la próxima.
    fn serve_connection(
        mut stream: TcpStream,
        handler: &RequestHandler,
        metrics: &MetricsCollector,
    ) {
        let start = Instant::now();

        match handler.handle(&mut stream) {
            Ok(Some(served)) => {
                metrics.record_request(
                    served.status.as_u16(),
                    served.bytes_sent,
                    start.elapsed(),
                );
                println!(
                    "   ✅ {} {} ({} bytes, {:.2}ms)",
                    served.status,
                    served.path,
                    served.bytes_sent,
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            Ok(None) => {
                println!("   ✅ Conexión cerrada sin datos");
            }
            Err(err) => {
                metrics.record_io_error();
                eprintln!("   ❌ Error atendiendo la conexión: {}", err);
            }
        }
        // El stream muere acá: la conexión se cierra haya fallado o no
        // el handler
    }
}
