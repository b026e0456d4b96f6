//! Persistent singly-linked list of slots.
//!
//! A [`SlotList`] is never edited once built. Operations that change the sequence return a new list that shares
//! every node past the point of change with the old one, so a list captured by an in-flight dispatch stays valid
//! while the signal moves on to a newer list.

use std::rc::Rc;

use crate::{error::SignalError, listener::ListenerId, slot::Slot};

/// An immutable list of slots. Cloning is O(1) and shares all nodes.
pub struct SlotList<T>(Option<Rc<Node<T>>>);

struct Node<T> {
    head: Slot<T>,
    tail: SlotList<T>,
}

impl<T> Clone for SlotList<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for SlotList<T> {
    fn default() -> Self { Self::NIL }
}

impl<T> Drop for Node<T> {
    // Unlink uniquely owned successors one at a time so long lists don't drop recursively
    fn drop(&mut self) {
        let mut next = self.tail.0.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => next = node.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T> SlotList<T> {
    /// The empty list, and the terminator of every non-empty one
    pub const NIL: SlotList<T> = SlotList(None);

    /// Builds a one-element extension of `tail` (or of [`SlotList::NIL`] when no tail is given).
    pub fn create(head: Option<Slot<T>>, tail: Option<SlotList<T>>) -> Result<Self, SignalError> {
        match (head, tail) {
            (None, None) => Err(SignalError::InvalidArgument("head and tail are both absent; use SlotList::NIL instead")),
            (None, Some(_)) => Err(SignalError::InvalidArgument("head cannot be absent")),
            (Some(head), tail) => Ok(Self::cons(head, tail.unwrap_or(Self::NIL))),
        }
    }

    fn cons(head: Slot<T>, tail: SlotList<T>) -> Self { Self(Some(Rc::new(Node { head, tail }))) }

    pub fn non_empty(&self) -> bool { self.0.is_some() }

    pub fn is_empty(&self) -> bool { self.0.is_none() }

    /// Number of slots. Walks the whole list.
    pub fn len(&self) -> usize { self.iter().count() }

    pub fn head(&self) -> Option<&Slot<T>> { self.0.as_ref().map(|node| &node.head) }

    pub fn tail(&self) -> Option<&SlotList<T>> { self.0.as_ref().map(|node| &node.tail) }

    /// True when both lists are the same value: both empty, or starting at the same node
    pub fn ptr_eq(&self, other: &SlotList<T>) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn iter(&self) -> Iter<'_, T> { Iter { current: self } }

    /// O(1). The new list's tail is this list.
    pub fn prepend(&self, slot: Slot<T>) -> SlotList<T> { Self::cons(slot, self.clone()) }

    /// O(n). Every existing node is copied since a node's tail can't be changed in place.
    pub fn append(&self, slot: Slot<T>) -> SlotList<T> {
        let prefix: Vec<Slot<T>> = self.iter().cloned().collect();
        Self::rebuild(prefix, Self::cons(slot, Self::NIL))
    }

    /// Inserts `slot` in front of the first slot with a strictly lower priority, or at the end if there is none.
    /// Slots of equal priority keep their registration order.
    pub fn insert_with_priority(&self, slot: Slot<T>) -> SlotList<T> {
        let priority = slot.priority();
        let mut prefix = Vec::new();
        let mut current = self;
        while let Some(node) = &current.0 {
            if priority > node.head.priority() {
                return Self::rebuild(prefix, current.prepend(slot));
            }
            prefix.push(node.head.clone());
            current = &node.tail;
        }
        Self::rebuild(prefix, Self::cons(slot, Self::NIL))
    }

    /// Returns this list without the slot registered for `listener`.
    /// Only the nodes before the match are copied; when nothing matches the list itself is returned.
    pub fn filter_not(&self, listener: impl Into<ListenerId>) -> SlotList<T> {
        let listener = listener.into();
        let mut prefix = Vec::new();
        let mut current = self;
        while let Some(node) = &current.0 {
            if node.head.listener_id() == listener {
                return Self::rebuild(prefix, node.tail.clone());
            }
            prefix.push(node.head.clone());
            current = &node.tail;
        }
        self.clone()
    }

    pub fn contains(&self, listener: impl Into<ListenerId>) -> bool {
        let listener = listener.into();
        self.iter().any(|slot| slot.listener_id() == listener)
    }

    pub fn find(&self, listener: impl Into<ListenerId>) -> Option<Slot<T>> {
        let listener = listener.into();
        self.iter().find(|slot| slot.listener_id() == listener).cloned()
    }

    // Fresh nodes for `prefix`, in order, in front of the shared `rest`
    fn rebuild(prefix: Vec<Slot<T>>, rest: SlotList<T>) -> SlotList<T> {
        prefix.into_iter().rev().fold(rest, |list, slot| Self::cons(slot, list))
    }
}

/// Head-to-tail iterator over the slots of a list
pub struct Iter<'a, T> {
    current: &'a SlotList<T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a Slot<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current.0.as_ref()?;
        self.current = &node.tail;
        Some(&node.head)
    }
}

impl<'a, T> IntoIterator for &'a SlotList<T> {
    type Item = &'a Slot<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<T> std::fmt::Display for SlotList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[List ")?;
        for slot in self {
            write!(f, "{slot} -> ")?;
        }
        write!(f, "NIL]")
    }
}

impl<T> std::fmt::Debug for SlotList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_list().entries(self.iter()).finish() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Listener, OnceSignal};

    fn slot(signal: &OnceSignal<i32>, priority: i32) -> Slot<i32> {
        Slot::create(Some(Listener::new(|_: i32| {})), Some(signal), false, priority).unwrap()
    }

    fn ids(list: &SlotList<i32>) -> Vec<ListenerId> { list.iter().map(|s| s.listener_id()).collect() }

    fn list_of(slots: &[&Slot<i32>]) -> SlotList<i32> {
        slots.iter().rev().fold(SlotList::NIL, |list, s| list.prepend((*s).clone()))
    }

    #[test]
    fn test_nil() {
        let nil = SlotList::<i32>::NIL;
        assert!(!nil.non_empty());
        assert!(nil.is_empty());
        assert_eq!(nil.len(), 0);
        assert!(nil.head().is_none());
        assert!(nil.tail().is_none());
        assert!(nil.ptr_eq(&SlotList::NIL));
        assert_eq!(nil.to_string(), "[List NIL]");
    }

    #[test]
    fn test_create_rejects_missing_head() {
        let signal = OnceSignal::new();
        assert!(matches!(SlotList::<i32>::create(None, None), Err(SignalError::InvalidArgument(_))));
        assert!(matches!(SlotList::<i32>::create(None, Some(SlotList::NIL)), Err(SignalError::InvalidArgument(_))));

        let a = slot(&signal, 0);
        let list = SlotList::create(Some(a.clone()), None).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.tail().unwrap().ptr_eq(&SlotList::NIL));

        let b = slot(&signal, 0);
        let longer = SlotList::create(Some(b.clone()), Some(list.clone())).unwrap();
        assert_eq!(ids(&longer), vec![b.listener_id(), a.listener_id()]);
        assert!(longer.tail().unwrap().ptr_eq(&list));
    }

    #[test]
    fn test_prepend_shares_existing_nodes() {
        let signal = OnceSignal::new();
        let (a, b, c) = (slot(&signal, 0), slot(&signal, 0), slot(&signal, 0));
        let l1 = list_of(&[&a, &b]);
        let l2 = l1.prepend(c.clone());

        assert!(l2.tail().unwrap().ptr_eq(&l1));
        assert!(l2.tail().unwrap().tail().unwrap().ptr_eq(l1.tail().unwrap()));
        assert_eq!(ids(&l1), vec![a.listener_id(), b.listener_id()]);
        assert_eq!(l2.len(), 3);
    }

    #[test]
    fn test_append_and_filter_not() {
        let signal = OnceSignal::new();
        let (a, b, c, d) = (slot(&signal, 0), slot(&signal, 0), slot(&signal, 0), slot(&signal, 0));
        let list = list_of(&[&a, &b, &c]);

        let filtered = list.filter_not(&b);
        assert_eq!(ids(&filtered), vec![a.listener_id(), c.listener_id()]);
        // only the node before the match is copied
        assert!(!filtered.ptr_eq(&list));
        assert!(filtered.tail().unwrap().ptr_eq(list.tail().unwrap().tail().unwrap()));

        let appended = list.append(d.clone());
        assert_eq!(ids(&appended), vec![a.listener_id(), b.listener_id(), c.listener_id(), d.listener_id()]);

        // the source list is untouched
        assert_eq!(ids(&list), vec![a.listener_id(), b.listener_id(), c.listener_id()]);
    }

    #[test]
    fn test_append_copies_every_node() {
        let signal = OnceSignal::new();
        let (a, b, c) = (slot(&signal, 0), slot(&signal, 0), slot(&signal, 0));
        let list = list_of(&[&a, &b]);
        let appended = list.append(c);

        let mut old = list.clone();
        let mut new = appended.clone();
        while let (Some(old_tail), Some(new_tail)) = (old.tail().cloned(), new.tail().cloned()) {
            assert!(!old.ptr_eq(&new));
            old = old_tail;
            new = new_tail;
        }
        assert_eq!(SlotList::NIL.append(a.clone()).len(), 1);
    }

    #[test]
    fn test_filter_not_head_and_missing() {
        let signal = OnceSignal::new();
        let (a, b, stranger) = (slot(&signal, 0), slot(&signal, 0), slot(&signal, 0));
        let list = list_of(&[&a, &b]);

        // removing the head is just the tail
        assert!(list.filter_not(&a).ptr_eq(list.tail().unwrap()));
        // no match returns the very same list
        assert!(list.filter_not(&stranger).ptr_eq(&list));
        assert!(SlotList::<i32>::NIL.filter_not(&stranger).is_empty());
    }

    #[test]
    fn test_insert_with_priority() {
        let signal = OnceSignal::new();
        let f = slot(&signal, 1);
        let g = slot(&signal, 5);
        let h = slot(&signal, 5);
        let low = slot(&signal, -3);

        let list = SlotList::NIL.insert_with_priority(f.clone());
        let list = list.insert_with_priority(g.clone());
        assert_eq!(ids(&list), vec![g.listener_id(), f.listener_id()]);

        // equal priority goes behind the earlier registration
        let list = list.insert_with_priority(h.clone());
        assert_eq!(ids(&list), vec![g.listener_id(), h.listener_id(), f.listener_id()]);

        // lowest priority lands at the end
        let list = list.insert_with_priority(low.clone());
        assert_eq!(ids(&list), vec![g.listener_id(), h.listener_id(), f.listener_id(), low.listener_id()]);
    }

    #[test]
    fn test_insert_with_priority_shares_suffix() {
        let signal = OnceSignal::new();
        let (high, low) = (slot(&signal, 10), slot(&signal, 0));
        let list = list_of(&[&high, &low]);

        let mid = slot(&signal, 5);
        let inserted = list.insert_with_priority(mid.clone());
        assert_eq!(ids(&inserted), vec![high.listener_id(), mid.listener_id(), low.listener_id()]);
        assert!(inserted.tail().unwrap().tail().unwrap().ptr_eq(list.tail().unwrap()));

        let top = slot(&signal, 11);
        assert!(list.insert_with_priority(top).tail().unwrap().ptr_eq(&list));
    }

    #[test]
    fn test_contains_and_find() {
        let signal = OnceSignal::new();
        let (a, b, c) = (slot(&signal, 0), slot(&signal, 0), slot(&signal, 0));
        let list = list_of(&[&a, &b]);

        assert!(list.contains(&a));
        assert!(list.contains(b.listener_id()));
        assert!(!list.contains(&c));
        assert_eq!(list.find(&b), Some(b.clone()));
        assert!(list.find(&c).is_none());
        assert!(SlotList::<i32>::NIL.find(&a).is_none());
    }

    #[test]
    fn test_long_list_drops() {
        let signal = OnceSignal::new();
        let a = slot(&signal, 0);
        let mut list = SlotList::NIL;
        for _ in 0..200_000 {
            list = list.prepend(a.clone());
        }
        assert_eq!(list.len(), 200_000);
        drop(list);
    }
}
