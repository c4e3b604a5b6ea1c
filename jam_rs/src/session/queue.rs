use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::{Band, BandId};

/// 出演待ちのバンド
/// 先頭が今ステージで演奏しているバンド
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandQueue {
    bands: Vec<Band>,
}

impl BandQueue {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// ステージ上のバンド
    pub fn head(&self) -> Option<&Band> {
        self.bands.first()
    }

    pub fn head_id(&self) -> Option<BandId> {
        self.head().map(|band| band.id)
    }

    /// 先頭の次に出演するバンド
    pub fn next(&self) -> Option<&Band> {
        self.bands.get(1)
    }

    pub fn push(&mut self, band: Band) {
        self.bands.push(band);
    }

    /// 先頭のバンドを取り出して次のバンドを先頭にします。
    pub fn advance(&mut self) -> Option<Band> {
        if self.bands.is_empty() {
            return None;
        }
        Some(self.bands.remove(0))
    }

    pub fn get(&self, id: BandId) -> Option<&Band> {
        self.bands.iter().find(|band| band.id == id)
    }

    pub fn get_mut(&mut self, id: BandId) -> Option<&mut Band> {
        self.bands.iter_mut().find(|band| band.id == id)
    }

    pub fn position(&self, id: BandId) -> Option<usize> {
        self.bands.iter().position(|band| band.id == id)
    }

    pub fn is_head(&self, id: BandId) -> bool {
        self.head_id() == Some(id)
    }

    /// from 番目のバンドを to 番目に移動します。
    pub fn move_band(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        let len = self.bands.len();
        for index in [from, to] {
            if len <= index {
                return Err(SessionError::IndexOutOfRange { index, len });
            }
        }

        let band = self.bands.remove(from);
        self.bands.insert(to, band);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Band, SessionError> {
        let len = self.bands.len();
        if len <= index {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        Ok(self.bands.remove(index))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        self.bands.iter()
    }

    pub fn as_slice(&self) -> &[Band] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::BandQueue;
    use crate::error::SessionError;
    use crate::Band;

    fn queue_of(names: &[&str]) -> BandQueue {
        BandQueue::new(names.iter().map(|name| Band::manual(name, 6)).collect())
    }

    #[test]
    fn empty() {
        let mut queue = BandQueue::default();
        assert!(queue.head().is_none());
        assert!(queue.advance().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn advance_promotes_next() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let next_id = queue.next().unwrap().id;

        let finished = queue.advance().unwrap();
        assert_eq!(finished.name, "a");
        assert_eq!(queue.head_id(), Some(next_id));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn move_band() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.move_band(2, 0).unwrap();
        let names: Vec<&str> = queue.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        assert_eq!(
            queue.move_band(0, 3),
            Err(SessionError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn remove() {
        let mut queue = queue_of(&["a", "b"]);
        assert_eq!(queue.remove(1).unwrap().name, "b");
        assert!(queue.remove(1).is_err());
        assert_eq!(queue.len(), 1);
    }
}
