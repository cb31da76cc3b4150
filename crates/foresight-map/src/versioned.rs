// -------------------------------------------------------------------
// Versioned
// -------------------------------------------------------------------

/// A value with a counter bumped on every write access.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    pub fn set(&mut self, data: T) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

// -------------------------------------------------------------------
// Memoized
// -------------------------------------------------------------------

/// A value derived from `S`, recomputed only when its key changes.
pub struct Memoized<S, K, V> {
    recomputed: u64,
    last: Option<(K, V)>,
    get_key: Box<dyn Fn(&S) -> K>,
    calc: Box<dyn Fn(&S) -> V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            recomputed: 0,
            last: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    pub fn get<'a>(&'a mut self, source: &S) -> &'a V {
        let key = (self.get_key)(source);
        let entry = match self.last.take() {
            Some((k, v)) if k == key => (k, v),
            _ => {
                self.recomputed = self.recomputed.wrapping_add(1);
                (key, (self.calc)(source))
            }
        };
        &self.last.insert(entry).1
    }

    /// How many times the value has been computed.
    pub fn recomputed(&self) -> u64 {
        self.recomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_on_new_versions() {
        let mut source = Versioned::new(vec![1, 2, 3]);
        let mut total = Memoized::new(
            |s: &Versioned<Vec<i32>>| s.version(),
            |s: &Versioned<Vec<i32>>| s.get().iter().sum::<i32>(),
        );

        assert_eq!(*total.get(&source), 6);
        assert_eq!(*total.get(&source), 6);
        assert_eq!(total.recomputed(), 1);

        source.set(vec![10]);
        assert_eq!(*total.get(&source), 10);
        assert_eq!(total.recomputed(), 2);
    }
}
