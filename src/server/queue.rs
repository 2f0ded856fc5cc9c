//! # Cola de Conexiones
//! src/server/queue.rs
//!
//! Implementa la cola acotada y thread-safe que conecta al acceptor con
//! el pool de workers. Es un buffer circular de capacidad fija protegido
//! por un mutex y dos variables de condición ("hay espacio" / "hay
//! elementos"), siguiendo el patrón monitor: toda espera re-verifica su
//! predicado en un loop.
//!
//! La cola es genérica sobre el handle de conexión: en producción guarda
//! `TcpStream`, en los tests guarda enteros sintéticos. Soltar el handle
//! (drop) equivale a cerrar la conexión.

use std::sync::{Condvar, Mutex};

/// Errores de las operaciones de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// La cola fue apagada: no se admiten nuevos elementos y, una vez
    /// drenada, tampoco se entregan más
    Shutdown,

    /// Un primitivo de sincronización quedó inutilizable (lock
    /// envenenado por un panic ajeno). Fatal, no se reintenta
    Poisoned,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Shutdown => write!(f, "queue is shut down"),
            QueueError::Poisoned => write!(f, "queue lock poisoned"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Estado interno de la cola, protegido por el mutex
struct QueueState<T> {
    /// Buffer circular; los slots fuera del rango vivo quedan en `None`
    slots: Vec<Option<T>>,

    /// Índice del próximo elemento a desencolar
    read_idx: usize,

    /// Índice del próximo slot libre para encolar
    write_idx: usize,

    /// Cantidad de elementos actualmente encolados
    length: usize,

    /// Flag de apagado: pasa de false a true una sola vez
    shutdown: bool,
}

/// Cola FIFO acotada de handles de conexión
///
/// Compartida entre un único productor (el acceptor) y N consumidores
/// (los workers). El productor se bloquea cuando la cola está llena
/// (backpressure) y los consumidores cuando está vacía.
pub struct ConnectionQueue<T> {
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> ConnectionQueue<T> {
    /// Crea una cola vacía con la capacidad indicada
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::server::ConnectionQueue;
    ///
    /// let queue: ConnectionQueue<u32> = ConnectionQueue::new(5);
    /// assert_eq!(queue.capacity(), 5);
    /// assert!(queue.is_empty().unwrap());
    /// ```
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self {
            state: Mutex::new(QueueState {
                slots,
                read_idx: 0,
                write_idx: 0,
                length: 0,
                shutdown: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Encola un handle, bloqueando mientras la cola esté llena
    ///
    /// Si el apagado ya fue señalado (o se señala durante la espera),
    /// retorna `QueueError::Shutdown` sin insertar: después del apagado
    /// no se admiten conexiones nuevas aunque quede espacio.
    pub fn enqueue(&self, handle: T) -> Result<(), QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::Poisoned)?;

        while state.length == state.slots.len() && !state.shutdown {
            state = self
                .not_full
                .wait(state)
                .map_err(|_| QueueError::Poisoned)?;
        }

        if state.shutdown {
            return Err(QueueError::Shutdown);
        }

        let capacity = state.slots.len();
        let idx = state.write_idx;
        state.slots[idx] = Some(handle);
        state.write_idx = (idx + 1) % capacity;
        state.length += 1;

        // Despertar a un consumidor esperando elementos
        self.not_empty.notify_one();

        Ok(())
    }

    /// Desencola el handle más antiguo, bloqueando mientras la cola
    /// esté vacía
    ///
    /// Política de drenado: el apagado no aborta la entrega de lo ya
    /// encolado. Mientras haya elementos, `dequeue` los entrega en
    /// orden FIFO incluso con el flag de apagado activo; recién cuando
    /// la cola se observa vacía retorna `QueueError::Shutdown`.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::Poisoned)?;

        while state.length == 0 && !state.shutdown {
            state = self
                .not_empty
                .wait(state)
                .map_err(|_| QueueError::Poisoned)?;
        }

        if state.length == 0 {
            return Err(QueueError::Shutdown);
        }

        let capacity = state.slots.len();
        let idx = state.read_idx;
        let handle = state.slots[idx]
            .take()
            .expect("live queue slot must hold a handle");
        state.read_idx = (idx + 1) % capacity;
        state.length -= 1;

        // Despertar a un productor esperando espacio
        self.not_full.notify_one();

        Ok(handle)
    }

    /// Señala el apagado de la cola
    ///
    /// Es idempotente: llamarla dos veces no tiene efecto adicional.
    /// Activa el flag y despierta a TODOS los threads bloqueados en
    /// `enqueue` o `dequeue` para que re-evalúen su predicado. No borra
    /// ni altera el contenido pendiente.
    pub fn shutdown(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().map_err(|_| QueueError::Poisoned)?;
        state.shutdown = true;

        self.not_empty.notify_all();
        self.not_full.notify_all();

        Ok(())
    }

    /// Retorna la cantidad de elementos encolados
    pub fn len(&self) -> Result<usize, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::Poisoned)?;
        Ok(state.length)
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    /// Verifica si la cola está llena
    pub fn is_full(&self) -> Result<bool, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::Poisoned)?;
        Ok(state.length == state.slots.len())
    }

    /// Retorna la capacidad fija de la cola
    pub fn capacity(&self) -> usize {
        // La capacidad no cambia nunca; si el lock está envenenado el
        // resto de las operaciones ya lo reporta
        match self.state.lock() {
            Ok(state) => state.slots.len(),
            Err(poisoned) => poisoned.into_inner().slots.len(),
        }
    }

    /// Verifica si el apagado ya fue señalado
    pub fn is_shutdown(&self) -> Result<bool, QueueError> {
        let state = self.state.lock().map_err(|_| QueueError::Poisoned)?;
        Ok(state.shutdown)
    }
}
