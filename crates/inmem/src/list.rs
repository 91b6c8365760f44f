use std::collections::VecDeque;

use parking_lot::Mutex;

/// Lista ordenada de strings com mutex próprio.
///
/// A lista é mutada pelo interior estável do item, nunca trocando a
/// variante de valor; o mutex dá linearizabilidade por lista.
#[derive(Default)]
pub struct ValueList {
    inner: Mutex<VecDeque<String>>,
}

impl ValueList {
    /// Acrescenta `values` no início, preservando a ordem do slice:
    /// `push_front(["1", "2"])` sobre `[3]` resulta em `[1, 2, 3]`.
    pub fn push_front(&self, values: &[String]) {
        let mut list = self.inner.lock();
        for value in values.iter().rev() {
            list.push_front(value.clone());
        }
    }

    pub fn push_back(&self, values: &[String]) {
        let mut list = self.inner.lock();
        for value in values {
            list.push_back(value.clone());
        }
    }

    /// Remove até `count` valores do início.
    pub fn pop_front(&self, count: usize) -> Vec<String> {
        let mut list = self.inner.lock();
        let n = count.min(list.len());
        list.drain(..n).collect()
    }

    /// Remove até `count` valores do fim, do último para o primeiro.
    pub fn pop_back(&self, count: usize) -> Vec<String> {
        let mut list = self.inner.lock();
        let n = count.min(list.len());
        let mut result = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(value) = list.pop_back() {
                result.push(value);
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Intervalo inclusivo no estilo Redis: índices negativos contam do
    /// fim, start fora do alcance devolve vazio, stop é truncado no fim.
    pub fn range(&self, start: i64, stop: i64) -> Vec<String> {
        let list = self.inner.lock();
        let len = list.len() as i64;
        if len == 0 {
            return Vec::new();
        }
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start >= len || stop < 0 || start > stop {
            return Vec::new();
        }
        list.range(start as usize..=stop as usize).cloned().collect()
    }
}
