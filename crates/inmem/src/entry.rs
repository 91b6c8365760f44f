use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use dashmap::DashSet;
use parking_lot::{Mutex, RwLock};

use crate::list::ValueList;
use crate::ttl_queue::TtlEntry;

/// Variante de valor de um item estendido.
///
/// Lista e conjunto carregam a própria sincronização e são mutados pelo
/// interior estável do item; o contador é um `AtomicI64` para que `incr`
/// funcione sem trocar a variante.
pub enum Value {
    Str(String),
    Counter(AtomicI64),
    List(ValueList),
    Set(DashSet<String>),
}

/// Estado de TTL de um item.
///
/// `Linked` é comparado somente por identidade (`Arc::ptr_eq`); os demais
/// estados são as sentinelas do aperto de mão entre callers e janitor.
#[derive(Clone, Default)]
pub enum TtlState {
    /// Sem TTL associado.
    #[default]
    None,
    /// TTL pedido, mas o janitor ainda não ligou o item ao heap.
    Pending,
    /// Entrada viva no heap de expiração.
    Linked(Arc<TtlEntry>),
    /// O janitor escolheu o item para expirar e está removendo-o.
    Deleting,
    /// O janitor terminou de remover o item.
    Deleted,
}

/// Tag de TTL de um item. Toda transição passa por uma seção crítica
/// curta; a troca condicionada de `Linked` é o CAS do protocolo.
#[derive(Default)]
pub struct TtlSlot(Mutex<TtlState>);

impl TtlSlot {
    pub fn load(&self) -> TtlState {
        self.0.lock().clone()
    }

    pub fn store(&self, state: TtlState) {
        *self.0.lock() = state;
    }

    /// Troca para `new` somente se o estado atual for `Linked` da mesma
    /// entrada. Falha quando o TTL mudou ou o item foi sobrescrito.
    pub fn swap_linked(&self, entry: &Arc<TtlEntry>, new: TtlState) -> bool {
        let mut state = self.0.lock();
        match &*state {
            TtlState::Linked(current) if Arc::ptr_eq(current, entry) => {
                *state = new;
                true
            }
            _ => false,
        }
    }
}

/// Implementado por todo tipo de item que carrega uma tag de TTL.
pub trait TtlTagged: Send + Sync + 'static {
    fn ttl_slot(&self) -> &TtlSlot;
}

/// Item do cache básico: valor string imutável + tag de TTL.
pub struct StrItem {
    value: String,
    ttl: TtlSlot,
}

impl StrItem {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            ttl: TtlSlot::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl TtlTagged for StrItem {
    fn ttl_slot(&self) -> &TtlSlot {
        &self.ttl
    }
}

/// Item do cache estendido: a variante de valor é trocável por CAS para
/// que `incr` promova uma string numérica a contador sem lock global.
pub struct ExtItem {
    value: RwLock<Arc<Value>>,
    ttl: TtlSlot,
}

impl ExtItem {
    pub fn new(value: Value) -> Self {
        Self {
            value: RwLock::new(Arc::new(value)),
            ttl: TtlSlot::default(),
        }
    }

    pub fn value(&self) -> Arc<Value> {
        self.value.read().clone()
    }

    /// Instala `new` somente se `current` ainda for a variante vigente.
    pub fn compare_and_swap(&self, current: &Arc<Value>, new: Arc<Value>) -> bool {
        let mut slot = self.value.write();
        if Arc::ptr_eq(&slot, current) {
            *slot = new;
            true
        } else {
            false
        }
    }
}

impl TtlTagged for ExtItem {
    fn ttl_slot(&self) -> &TtlSlot {
        &self.ttl
    }
}
