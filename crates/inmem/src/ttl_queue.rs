use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;
use tokio::time::Instant;

/// Entrada viva da fila de expiração: chave + instante absoluto de expiração.
///
/// Cada entrada carrega o próprio índice dentro do heap, mantido a cada
/// troca, para que `update` e `delete` custem O(log n) sem varredura.
/// Índice −1 significa "fora do heap".
pub struct TtlEntry {
    key: String,
    expires_at: RwLock<Instant>,
    index: AtomicI64,
}

impl TtlEntry {
    fn new(key: String, expires_at: Instant) -> Arc<Self> {
        Arc::new(Self {
            key,
            expires_at: RwLock::new(expires_at),
            index: AtomicI64::new(-1),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expires_at(&self) -> Instant {
        *self.expires_at.read()
    }

    fn index(&self) -> i64 {
        self.index.load(Ordering::Acquire)
    }

    fn set_index(&self, index: i64) {
        self.index.store(index, Ordering::Release);
    }
}

/// Min-heap indexado de expirações, ordenado pelo instante mais próximo.
///
/// Pertence exclusivamente ao janitor; nenhuma outra task o toca.
#[derive(Default)]
pub struct TtlQueue {
    heap: Vec<Arc<TtlEntry>>,
}

impl TtlQueue {
    /// Insere uma nova entrada e devolve o ponteiro compartilhado dela.
    pub fn push(&mut self, key: String, expires_at: Instant) -> Arc<TtlEntry> {
        let entry = TtlEntry::new(key, expires_at);
        entry.set_index(self.heap.len() as i64);
        self.heap.push(entry.clone());
        self.sift_up(self.heap.len() - 1);
        entry
    }

    /// Entrada com o menor instante de expiração, se houver.
    pub fn peek(&self) -> Option<&Arc<TtlEntry>> {
        self.heap.first()
    }

    /// Remove e devolve a raiz.
    pub fn pop(&mut self) -> Option<Arc<TtlEntry>> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop()?;
        entry.set_index(-1);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(entry)
    }

    /// Reescreve o instante de expiração da entrada e conserta o heap
    /// a partir do índice registrado nela.
    pub fn update(&mut self, entry: &Arc<TtlEntry>, expires_at: Instant) {
        *entry.expires_at.write() = expires_at;
        let index = entry.index();
        if index >= 0 {
            self.fix(index as usize);
        }
    }

    /// Remove a entrada da posição registrada nela. Índice vira −1.
    pub fn delete(&mut self, entry: &Arc<TtlEntry>) {
        let index = entry.index();
        if index < 0 {
            return;
        }
        let index = index as usize;
        let last = self.heap.len() - 1;
        self.swap(index, last);
        if let Some(removed) = self.heap.pop() {
            removed.set_index(-1);
        }
        if index < self.heap.len() {
            self.fix(index);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for entry in self.heap.drain(..) {
            entry.set_index(-1);
        }
    }

    /// Sobe ou desce conforme necessário após uma reescrita no meio do heap.
    fn fix(&mut self, index: usize) {
        if index > 0 && self.before(index, (index - 1) / 2) {
            self.sift_up(index);
        } else {
            self.sift_down(index);
        }
    }

    fn before(&self, a: usize, b: usize) -> bool {
        self.heap[a].expires_at() < self.heap[b].expires_at()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.heap[a].set_index(a as i64);
        self.heap[b].set_index(b as i64);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.before(index, parent) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let mut smallest = index;
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            if left < self.heap.len() && self.before(left, smallest) {
                smallest = left;
            }
            if right < self.heap.len() && self.before(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }
}
