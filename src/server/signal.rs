//! # Señal de Apagado
//! src/server/signal.rs
//!
//! Flag de cancelación explícito que reemplaza al clásico global
//! `keep_going` de los servidores en C. El handler de SIGINT y los
//! tests disparan exactamente la misma función, así el protocolo de
//! apagado no depende de ningún mecanismo de entrega de señales.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Señal de apagado compartida entre el proceso y el acceptor
///
/// Es un flag de un solo sentido: una vez disparado no se revierte.
/// Clonarla comparte el mismo flag subyacente.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Crea una señal todavía no disparada
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispara el apagado
    ///
    /// Idempotente: disparos posteriores no tienen efecto adicional.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Consulta si el apagado ya fue disparado
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[test]
    fn test_trigger_is_one_way() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_triggered());

        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_clones_share_the_same_flag() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();

        clone.trigger();
        assert!(signal.is_triggered());
    }
}
