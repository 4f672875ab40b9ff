/// One decoded resource flowing through a pipeline.
///
/// Operations receive `&mut Item<T>` and may mutate it in place; the item is
/// dropped once the visit that produced it returns unless an operation clones
/// it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<T> {
    /// Where the item came from: a path, a URL, `STDIN`, or a caller label.
    pub source: String,
    /// 1-based line on which the document starts, when known.
    pub line: Option<usize>,
    pub payload: T,
}

impl<T> Item<T> {
    pub fn new(source: impl Into<String>, payload: T) -> Self {
        Self {
            source: source.into(),
            line: None,
            payload,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Build a sibling item that shares this item's origin.
    pub fn derive<U>(&self, payload: U) -> Item<U> {
        Item {
            source: self.source.clone(),
            line: self.line,
            payload,
        }
    }
}
