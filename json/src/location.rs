use std::fmt::{self, Write};

/// `Location` of a value within a document. A borrowed linked list threaded
/// through the call stack of whatever is walking the document, so building
/// one costs nothing until it's actually formatted or converted to a
/// `Pointer`.
#[derive(Copy, Clone)]
pub enum Location<'a> {
    Root,
    Property(LocatedProperty<'a>),
    Item(LocatedItem<'a>),
    EndOfArray(&'a Location<'a>),
    NextProperty(&'a Location<'a>),
}

impl<'a> Location<'a> {
    pub fn push_prop(&'a self, name: &'a str) -> Location<'a> {
        Location::Property(LocatedProperty { parent: self, name })
    }

    pub fn push_item(&'a self, index: usize) -> Location<'a> {
        Location::Item(LocatedItem { parent: self, index })
    }

    pub fn push_end_of_array(&'a self) -> Location<'a> {
        Location::EndOfArray(self)
    }

    pub fn push_next_property(&'a self) -> Location<'a> {
        Location::NextProperty(self)
    }

    pub fn pointer_str(&'a self) -> PointerStr<'a> {
        PointerStr(*self)
    }

    pub fn url_escaped(&'a self) -> UrlEscaped<'a> {
        UrlEscaped(*self)
    }

    /// Folds from the root outward, so the location passed last is `self`.
    pub fn fold<T, F>(&self, initial: T, mut fun: F) -> T
    where
        F: FnMut(Location<'a>, T) -> T,
    {
        self.fold_inner(initial, &mut fun)
    }

    fn fold_inner<T, F>(&self, initial: T, fun: &mut F) -> T
    where
        F: FnMut(Location<'a>, T) -> T,
    {
        let mut acc = initial;
        match self {
            Location::Root => {}
            Location::Property(prop) => acc = prop.parent.fold_inner(acc, fun),
            Location::Item(item) => acc = item.parent.fold_inner(acc, fun),
            Location::EndOfArray(parent) => acc = parent.fold_inner(acc, fun),
            Location::NextProperty(parent) => acc = parent.fold_inner(acc, fun),
        }
        fun(*self, acc)
    }
}

impl<'a> fmt::Debug for Location<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pointer_str())
    }
}

#[derive(Copy, Clone)]
pub struct LocatedProperty<'a> {
    pub parent: &'a Location<'a>,
    pub name: &'a str,
}

#[derive(Copy, Clone)]
pub struct LocatedItem<'a> {
    pub parent: &'a Location<'a>,
    pub index: usize,
}

pub struct PointerStr<'a>(Location<'a>);
pub struct UrlEscaped<'a>(Location<'a>);

impl<'a> fmt::Display for PointerStr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fold(Ok(()), move |loc, result: std::fmt::Result| {
            result.and_then(|_| match loc {
                Location::Root => Ok(()),
                Location::Property(LocatedProperty { name, .. }) => {
                    f.write_char('/')?;
                    for c in name.chars() {
                        match c {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            _ => f.write_char(c)?,
                        }
                    }
                    Ok(())
                }
                Location::Item(LocatedItem { index, .. }) => write!(f, "/{index}"),
                Location::EndOfArray(_) => write!(f, "/-"),
                Location::NextProperty(_) => write!(f, "/*"),
            })
        })
    }
}

impl<'a> fmt::Display for UrlEscaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fold(Ok(()), move |loc, result| {
            result.and_then(|_| match loc {
                Location::Root => Ok(()),
                Location::Property(LocatedProperty { name, .. }) => {
                    f.write_char('/')?;
                    for p in percent_encoding::utf8_percent_encode(name, PTR_ESCAPE_SET) {
                        for c in p.chars() {
                            match c {
                                '~' => f.write_str("~0")?,
                                '/' => f.write_str("~1")?,
                                _ => f.write_char(c)?,
                            }
                        }
                    }
                    Ok(())
                }
                Location::Item(LocatedItem { index, .. }) => write!(f, "/{index}"),
                Location::EndOfArray(_) => write!(f, "/-"),
                Location::NextProperty(_) => write!(f, "/*"),
            })
        })
    }
}

const PTR_ESCAPE_SET: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b'%')
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'&')
    .add(b'=');

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_str_escaping() {
        let root = Location::Root;
        let a = root.push_prop("a~b/c");
        let b = a.push_item(3);
        let c = b.push_end_of_array();
        assert_eq!(c.pointer_str().to_string(), "/a~0b~1c/3/-");
    }

    #[test]
    fn test_url_escaped() {
        let root = Location::Root;
        let l = root.push_prop("ba~ ba/ 45");
        assert_eq!(l.url_escaped().to_string(), "/ba~0%20ba~1%2045");
    }
}
