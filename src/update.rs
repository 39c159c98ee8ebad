//! update: цепочки замен (update chains) поверх базовых items.
//!
//! Цепочка: список чанков по UPDATE_CHUNK_SLOTS слотов с явной ссылкой `next`.
//! Голова содержит самые свежие записи: обход head → tail, слот за слотом,
//! первый непустой слот (Value или Tombstone) и есть текущее значение.
//! Резолвер только читает цепочку.

use crate::page::item::Item;

/// Число слотов в одном чанке.
pub const UPDATE_CHUNK_SLOTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateSlot {
    #[default]
    Empty,
    Tombstone,
    Value(Vec<u8>),
}

impl UpdateSlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, UpdateSlot::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChunk {
    slots: [UpdateSlot; UPDATE_CHUNK_SLOTS],
    next: Option<Box<UpdateChunk>>,
}

impl Default for UpdateChunk {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| UpdateSlot::Empty),
            next: None,
        }
    }
}

impl UpdateChunk {
    pub fn slots(&self) -> &[UpdateSlot] {
        &self.slots
    }

    pub fn next(&self) -> Option<&UpdateChunk> {
        self.next.as_deref()
    }
}

/// Цепочка замен одного слота страницы.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateChain {
    head: UpdateChunk,
}

impl UpdateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Собрать цепочку из чанков (первый: голова). Chunk короче
    /// UPDATE_CHUNK_SLOTS дополняется Empty; длиннее: разбивается.
    pub fn from_chunks(chunks: Vec<Vec<UpdateSlot>>) -> Self {
        let mut flat: Vec<Vec<UpdateSlot>> = Vec::new();
        for c in chunks {
            if c.is_empty() {
                flat.push(Vec::new());
                continue;
            }
            for part in c.chunks(UPDATE_CHUNK_SLOTS) {
                flat.push(part.to_vec());
            }
        }
        let mut next: Option<Box<UpdateChunk>> = None;
        for part in flat.into_iter().rev() {
            let mut chunk = UpdateChunk::default();
            for (dst, src) in chunk.slots.iter_mut().zip(part) {
                *dst = src;
            }
            chunk.next = next;
            next = Some(Box::new(chunk));
        }
        Self {
            head: next.map(|b| *b).unwrap_or_default(),
        }
    }

    /// Записать новое значение: слот прямо перед самым свежим непустым слотом
    /// головы. Если свободного слота перед ним нет, создаётся новый чанк-голова.
    pub fn record(&mut self, slot: UpdateSlot) {
        if slot.is_empty() {
            return;
        }
        let pos = match self.head.slots.iter().position(|s| !s.is_empty()) {
            Some(0) => {
                let old = std::mem::take(&mut self.head);
                self.head.next = Some(Box::new(old));
                UPDATE_CHUNK_SLOTS - 1
            }
            Some(p) => p - 1,
            None => UPDATE_CHUNK_SLOTS - 1,
        };
        self.head.slots[pos] = slot;
    }

    pub fn head(&self) -> &UpdateChunk {
        &self.head
    }

    pub fn chunks(&self) -> ChunkIter<'_> {
        ChunkIter { cur: Some(&self.head) }
    }

    /// Все слоты head → tail.
    pub fn slots(&self) -> impl Iterator<Item = &UpdateSlot> {
        self.chunks().flat_map(|c| c.slots.iter())
    }

    /// Самый свежий непустой слот.
    pub fn latest(&self) -> Option<&UpdateSlot> {
        self.slots().find(|s| !s.is_empty())
    }
}

pub struct ChunkIter<'a> {
    cur: Option<&'a UpdateChunk>,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a UpdateChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.cur?;
        self.cur = c.next.as_deref();
        Some(c)
    }
}

/// Логическое текущее значение слота.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentValue<'a> {
    /// Замен нет: действует базовый item.
    Base(&'a Item),
    Updated(&'a [u8]),
    Deleted,
}

/// last-writer-wins: первый непустой слот от головы, иначе базовый item.
pub fn current_value<'a>(chain: Option<&'a UpdateChain>, base: &'a Item) -> CurrentValue<'a> {
    match chain.and_then(|c| c.latest()) {
        Some(UpdateSlot::Value(v)) => CurrentValue::Updated(v),
        Some(UpdateSlot::Tombstone) => CurrentValue::Deleted,
        Some(UpdateSlot::Empty) | None => CurrentValue::Base(base),
    }
}
