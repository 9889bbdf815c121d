use crate::{Entity, Error, Mapping, Result};
use std::{
    any::{self, Any, TypeId},
    cell::RefCell,
    collections::{HashMap, HashSet},
    sync::{Arc, LazyLock, RwLock},
};

type Cache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static MAPPINGS: LazyLock<Cache> = LazyLock::new(Default::default);

thread_local! {
    static IN_PROGRESS: RefCell<HashSet<TypeId>> = RefCell::new(HashSet::new());
}

/// Marks a type as being reflected on this thread.
struct Reflecting(TypeId);

impl Reflecting {
    fn enter<E: 'static>() -> Result<Self> {
        let key = TypeId::of::<E>();
        IN_PROGRESS.with_borrow_mut(|v| {
            if v.insert(key) {
                Ok(Reflecting(key))
            } else {
                Err(Error::mapping(format!(
                    "`{}` embeds itself, recursive embedding cannot be mapped",
                    any::type_name::<E>()
                )))
            }
        })
    }
}

impl Drop for Reflecting {
    fn drop(&mut self) {
        IN_PROGRESS.with_borrow_mut(|v| v.remove(&self.0));
    }
}

fn cached<E: Entity>() -> Option<Arc<Mapping<E>>> {
    MAPPINGS
        .read()
        .ok()?
        .get(&TypeId::of::<E>())
        .cloned()?
        .downcast::<Mapping<E>>()
        .ok()
}

/// Mapping of `E`, built from [`Entity::record`] and [`Entity::config`] on first use.
///
/// Two threads may build the same mapping concurrently, the first one stored is kept.
pub fn reflect<E: Entity>() -> Result<Arc<Mapping<E>>> {
    if let Some(mapping) = cached::<E>() {
        return Ok(mapping);
    }
    let guard = Reflecting::enter::<E>()?;
    let mapping = Mapping::new(E::record()?, &E::config())?;
    drop(guard);
    log::debug!(
        "Reflected {} as table `{}` with columns {:?}",
        any::type_name::<E>(),
        mapping.info.table_name,
        mapping.info.columns().collect::<Vec<_>>()
    );
    let mut cache = MAPPINGS
        .write()
        .map_err(|_| Error::mapping("The mapping cache is poisoned"))?;
    cache
        .entry(TypeId::of::<E>())
        .or_insert_with(|| Arc::new(mapping) as Arc<dyn Any + Send + Sync>)
        .clone()
        .downcast::<Mapping<E>>()
        .map_err(|_| Error::mapping(format!("Corrupted mapping for {}", any::type_name::<E>())))
}
