use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, Instant};
use tracing::debug;

use garoa_common::{CacheError, CacheResult};

use crate::entry::{TtlState, TtlTagged};
use crate::ttl_queue::TtlQueue;

/// Capacidade do canal de atualizações de TTL. Quando o janitor atrasa,
/// quem muda TTLs sofre backpressure aqui.
const TTL_UPDATE_BUFFER: usize = 64;

/// Mensagem para o janitor. `expires_at == None` remove o TTL da chave.
struct TtlUpdate<I> {
    key: String,
    item: Arc<I>,
    expires_at: Option<Instant>,
}

/// Estado compartilhado entre os handles do cache e o janitor.
///
/// O mapa é o dono canônico dos itens; o heap de expiração pertence só ao
/// janitor e toda coordenação passa pelo canal de updates e pelas tags de
/// TTL dos itens.
pub(crate) struct CacheShared<I: TtlTagged> {
    items: DashMap<String, Arc<I>>,
    ttl_tx: mpsc::Sender<TtlUpdate<I>>,
    shutdown_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl<I: TtlTagged> CacheShared<I> {
    pub(crate) fn new() -> Arc<Self> {
        let (ttl_tx, ttl_rx) = mpsc::channel(TTL_UPDATE_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared = Arc::new(Self {
            items: DashMap::new(),
            ttl_tx,
            shutdown_tx,
            closed: AtomicBool::new(false),
        });
        tokio::spawn(janitor(Arc::downgrade(&shared), ttl_rx, shutdown_rx));
        shared
    }

    /// Instala `item` na chave, substituindo o anterior, e registra o TTL.
    pub(crate) async fn set_item(&self, key: &str, item: Arc<I>, ttl: Duration) -> CacheResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        let old = self.items.insert(key.to_string(), Arc::clone(&item));
        if !ttl.is_zero() {
            item.ttl_slot().store(TtlState::Pending);
            self.send_ttl_update(key, Arc::clone(&item), Some(Instant::now() + ttl))
                .await?;
        }
        // o janitor pode estar expirando a versão anterior da chave neste
        // exato momento e apagar o item recém-gravado junto; espera o
        // aperto de mão terminar e regrava
        if let Some(old) = old {
            loop {
                match old.ttl_slot().load() {
                    TtlState::Deleting => tokio::task::yield_now().await,
                    TtlState::Deleted => {
                        self.items.insert(key.to_string(), item);
                        break;
                    }
                    _ => break,
                }
            }
        }
        Ok(())
    }

    pub(crate) fn get_item(&self, key: &str) -> CacheResult<Arc<I>> {
        self.items
            .get(key)
            .map(|item| Arc::clone(item.value()))
            .ok_or(CacheError::NotFound)
    }

    /// Devolve o item da chave, criando-o com `make` se não existir.
    /// O booleano indica se o item já existia.
    pub(crate) fn get_or_compute(
        &self,
        key: &str,
        make: impl FnOnce() -> Arc<I>,
    ) -> CacheResult<(Arc<I>, bool)> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        match self.items.entry(key.to_string()) {
            Entry::Occupied(occupied) => Ok((Arc::clone(occupied.get()), true)),
            Entry::Vacant(vacant) => {
                let item = make();
                vacant.insert(Arc::clone(&item));
                Ok((item, false))
            }
        }
    }

    pub(crate) fn del(&self, key: &str) {
        self.items.remove(key);
    }

    pub(crate) async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        let item = self.get_item(key)?;
        loop {
            match item.ttl_slot().load() {
                TtlState::Pending => {
                    if self.closed.load(Ordering::SeqCst) {
                        return Ok(Duration::ZERO);
                    }
                    // espera o janitor ligar o item ao heap
                    tokio::task::yield_now().await;
                }
                TtlState::None => return Ok(Duration::ZERO),
                TtlState::Linked(entry) => {
                    return Ok(entry.expires_at().saturating_duration_since(Instant::now()));
                }
                TtlState::Deleting | TtlState::Deleted => return Err(CacheError::NotFound),
            }
        }
    }

    pub(crate) async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let item = self.get_item(key)?;
        if ttl.is_zero() {
            item.ttl_slot().store(TtlState::None);
            self.send_ttl_update(key, item, None).await
        } else {
            self.send_ttl_update(key, item, Some(Instant::now() + ttl))
                .await
        }
    }

    async fn send_ttl_update(
        &self,
        key: &str,
        item: Arc<I>,
        expires_at: Option<Instant>,
    ) -> CacheResult<()> {
        let mut shutdown = self.shutdown_tx.subscribe();
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        let update = TtlUpdate {
            key: key.to_string(),
            item,
            expires_at,
        };
        tokio::select! {
            result = self.ttl_tx.send(update) => result.map_err(|_| CacheError::Closed),
            _ = shutdown.changed() => Err(CacheError::Closed),
        }
    }

    /// Encerra o cache: sinaliza o janitor, esvazia o mapa. Idempotente.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);
        self.items.clear();
    }
}

/// Task única que possui o heap de expiração e o timer.
///
/// Consome atualizações de TTL e dispara expirações; nunca toca o valor
/// dos itens, só as tags. Sai quando o cache é fechado ou quando todos os
/// handles são dropados.
async fn janitor<I: TtlTagged>(
    shared: Weak<CacheShared<I>>,
    mut updates: mpsc::Receiver<TtlUpdate<I>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut queue = TtlQueue::default();
    let timer = time::sleep(Duration::from_millis(1));
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                // updates atrasados no canal são descartados
                queue.clear();
                debug!("janitor encerrado");
                return;
            }
            update = updates.recv() => {
                let Some(update) = update else {
                    queue.clear();
                    return;
                };
                apply_update(&mut queue, update);
                if let Some(root) = queue.peek() {
                    timer.as_mut().reset(root.expires_at());
                }
            }
            () = timer.as_mut(), if !queue.is_empty() => {
                let Some(shared) = shared.upgrade() else {
                    queue.clear();
                    return;
                };
                expire_due(&shared, &mut queue);
                if let Some(root) = queue.peek() {
                    timer.as_mut().reset(root.expires_at());
                }
            }
        }
    }
}

/// Concilia uma atualização de TTL com o heap.
fn apply_update<I: TtlTagged>(queue: &mut TtlQueue, update: TtlUpdate<I>) {
    let TtlUpdate {
        key,
        item,
        expires_at,
    } = update;
    let slot = item.ttl_slot();
    match (slot.load(), expires_at) {
        // TTL já ligado ao heap: reescreve ou remove a entrada existente
        (TtlState::Linked(entry), Some(expires_at)) => queue.update(&entry, expires_at),
        (TtlState::Linked(entry), None) => {
            slot.store(TtlState::None);
            queue.delete(&entry);
        }
        // TTL novo: liga o item a uma entrada recém-criada
        (TtlState::None | TtlState::Pending, Some(expires_at)) => {
            let entry = queue.push(key, expires_at);
            slot.store(TtlState::Linked(entry));
        }
        // remoção de um TTL que o janitor nem chegou a ligar
        (TtlState::Pending, None) => slot.store(TtlState::None),
        (TtlState::None, None) => {}
        // o item já saiu (ou está saindo) pela expiração
        (TtlState::Deleting | TtlState::Deleted, _) => {}
    }
}

/// Remove do mapa toda chave cuja entrada na raiz do heap já venceu.
fn expire_due<I: TtlTagged>(shared: &CacheShared<I>, queue: &mut TtlQueue) {
    let now = Instant::now();
    while queue.peek().is_some_and(|root| root.expires_at() <= now) {
        let Some(entry) = queue.pop() else {
            break;
        };
        let key = entry.key();
        let Some(item) = shared.items.get(key).map(|item| Arc::clone(item.value())) else {
            continue;
        };
        // marca o item como em remoção; a falha do CAS significa que o
        // TTL mudou ou a chave foi sobrescrita desde o pop
        if !item.ttl_slot().swap_linked(&entry, TtlState::Deleting) {
            debug!("entrada de TTL obsoleta ignorada: {key}");
            continue;
        }
        // apaga somente se o item armazenado ainda é o que travamos
        shared
            .items
            .remove_if(key, |_, stored| Arc::ptr_eq(stored, &item));
        item.ttl_slot().store(TtlState::Deleted);
        debug!("chave expirada removida: {key}");
    }
}
