//! # Name tables
//!
//! OASIS names come in five kinds with reference numbers (cell, text
//! string, property name, property string, extension name) plus layer
//! names, which map name strings to layer/datatype intervals and carry no
//! reference numbers.
//!
//! A name is created on its first appearance and lives until its table is
//! dropped at end of parse.  The reference number is the name's stable
//! identity; a table assigns them implicitly in order of appearance or
//! takes them explicitly from `*_R` records, but never both ways.

use std::cell::{Cell,RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use super::oreal::Oreal;

/// A name string with its reference number and properties.  Shared
/// between the owning table and any records that reference it.
pub struct OasisName {
    name: Vec<u8>,
    refnum: Cell<u64>,
    /// XNAME records carry an attribute integer alongside the string
    pub attribute: Cell<u64>,
    props: RefCell<Vec<Property>>
}

impl OasisName {
    pub fn new(name: &[u8],refnum: u64) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_vec(),
            refnum: Cell::new(refnum),
            attribute: Cell::new(0),
            props: RefCell::new(Vec::new())
        })
    }
    pub fn name(&self) -> &[u8] {
        &self.name
    }
    /// lossy rendering for messages and listings
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).to_string()
    }
    pub fn refnum(&self) -> u64 {
        self.refnum.get()
    }
    pub fn add_property(&self,prop: Property) {
        self.props.borrow_mut().push(prop);
    }
    pub fn properties(&self) -> std::cell::Ref<Vec<Property>> {
        self.props.borrow()
    }
}

/// One property: a name, a value list, and the standard-property flag.
#[derive(Clone)]
pub struct Property {
    pub name: Rc<OasisName>,
    pub values: Vec<PropValue>,
    pub is_standard: bool
}

/// A property value.  The `Ref` variant keeps the on-file tag (13, 14, or
/// 15) so a re-emission is faithful.
#[derive(Clone)]
pub enum PropValue {
    Real(Oreal),
    Unsigned(u64),
    Signed(i64),
    AString(Vec<u8>),
    BString(Vec<u8>),
    NString(Vec<u8>),
    Ref(u8,Rc<OasisName>)
}

/// Value equality; references compare by the referenced string.
impl PartialEq for PropValue {
    fn eq(&self,other: &Self) -> bool {
        match (self,other) {
            (Self::Real(a),Self::Real(b)) => a==b,
            (Self::Unsigned(a),Self::Unsigned(b)) => a==b,
            (Self::Signed(a),Self::Signed(b)) => a==b,
            (Self::AString(a),Self::AString(b)) => a==b,
            (Self::BString(a),Self::BString(b)) => a==b,
            (Self::NString(a),Self::NString(b)) => a==b,
            (Self::Ref(ta,a),Self::Ref(tb,b)) => ta==tb && a.name()==b.name(),
            _ => false
        }
    }
}

impl PartialEq for Property {
    fn eq(&self,other: &Self) -> bool {
        self.is_standard==other.is_standard
            && self.name.name()==other.name.name()
            && self.values==other.values
    }
}

#[derive(Clone,Copy,PartialEq)]
enum RefnumPolicy {
    Unknown,
    Implicit,
    Explicit
}

/// One table of names of a single kind.
pub struct NameTable {
    kind: &'static str,
    list: Vec<Rc<OasisName>>,
    by_refnum: HashMap<u64,Rc<OasisName>>,
    by_name: HashMap<Vec<u8>,Rc<OasisName>>,
    next_refnum: u64,
    policy: RefnumPolicy
}

impl NameTable {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            list: Vec::new(),
            by_refnum: HashMap::new(),
            by_name: HashMap::new(),
            next_refnum: 0,
            policy: RefnumPolicy::Unknown
        }
    }
    pub fn kind(&self) -> &'static str {
        self.kind
    }
    /// names in order of appearance
    pub fn iter(&self) -> std::slice::Iter<Rc<OasisName>> {
        self.list.iter()
    }
    pub fn len(&self) -> usize {
        self.list.len()
    }
    fn add(&mut self,name: &[u8],refnum: u64) -> Result<Rc<OasisName>,String> {
        if self.by_refnum.contains_key(&refnum) {
            return Err(format!("duplicate {} reference number {}",self.kind,refnum));
        }
        let obj = OasisName::new(name,refnum);
        self.list.push(obj.clone());
        self.by_refnum.insert(refnum,obj.clone());
        self.by_name.insert(name.to_vec(),obj.clone());
        Ok(obj)
    }
    /// Register a name from a record without a reference number; the next
    /// number in sequence is assigned.
    pub fn register_implicit(&mut self,name: &[u8]) -> Result<Rc<OasisName>,String> {
        if self.policy==RefnumPolicy::Explicit {
            return Err(format!("{} records mix implicit and explicit reference numbers",self.kind));
        }
        self.policy = RefnumPolicy::Implicit;
        if self.by_name.contains_key(name) {
            return Err(format!("duplicate {} '{}'",self.kind,String::from_utf8_lossy(name)));
        }
        let refnum = self.next_refnum;
        self.next_refnum += 1;
        self.add(name,refnum)
    }
    /// Register a name from a record that carries its reference number.
    pub fn register_explicit(&mut self,name: &[u8],refnum: u64) -> Result<Rc<OasisName>,String> {
        if self.policy==RefnumPolicy::Implicit {
            return Err(format!("{} records mix implicit and explicit reference numbers",self.kind));
        }
        self.policy = RefnumPolicy::Explicit;
        if self.by_name.contains_key(name) {
            return Err(format!("duplicate {} '{}'",self.kind,String::from_utf8_lossy(name)));
        }
        self.add(name,refnum)
    }
    /// Resolve a reference number from a record body.
    pub fn by_refnum(&self,refnum: u64) -> Option<Rc<OasisName>> {
        self.by_refnum.get(&refnum).cloned()
    }
    pub fn by_name(&self,name: &[u8]) -> Option<Rc<OasisName>> {
        self.by_name.get(name).cloned()
    }
    /// Find or create, used on the creator side and for CELL records that
    /// name a cell never declared in a CELLNAME record.
    pub fn forge(&mut self,name: &[u8]) -> Rc<OasisName> {
        if let Some(obj) = self.by_name.get(name) {
            return obj.clone();
        }
        // explicit registrations may already hold the counter's value
        while self.by_refnum.contains_key(&self.next_refnum) {
            self.next_refnum += 1;
        }
        let refnum = self.next_refnum;
        self.next_refnum += 1;
        self.add(name,refnum).expect("forged refnum cannot collide")
    }
}

/// Half-open or closed layer/datatype interval in a LAYERNAME record.
#[derive(Clone,Copy,PartialEq,Debug)]
pub enum Interval {
    All,
    UpTo(u64),
    AtLeast(u64),
    Exact(u64),
    Range(u64,u64)
}

impl Interval {
    pub fn contains(&self,v: u64) -> bool {
        match self {
            Self::All => true,
            Self::UpTo(b) => v <= *b,
            Self::AtLeast(a) => v >= *a,
            Self::Exact(a) => v==*a,
            Self::Range(a,b) => v >= *a && v <= *b
        }
    }
}

/// A LAYERNAME record: a name bound to layer and datatype intervals,
/// separately for geometry and for text.
pub struct LayerName {
    pub name: Vec<u8>,
    pub is_text: bool,
    pub layers: Interval,
    pub types: Interval,
    props: RefCell<Vec<Property>>
}

impl LayerName {
    pub fn new(name: &[u8],is_text: bool,layers: Interval,types: Interval) -> Rc<Self> {
        Rc::new(Self { name: name.to_vec(), is_text, layers, types, props: RefCell::new(Vec::new()) })
    }
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).to_string()
    }
    pub fn add_property(&self,prop: Property) {
        self.props.borrow_mut().push(prop);
    }
    pub fn properties(&self) -> std::cell::Ref<Vec<Property>> {
        self.props.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn implicit_numbering() {
        let mut table = NameTable::new("CELLNAME");
        let a = table.register_implicit(b"A").expect("register failed");
        let b = table.register_implicit(b"B").expect("register failed");
        assert_eq!(a.refnum(),0);
        assert_eq!(b.refnum(),1);
        assert!(table.register_implicit(b"A").is_err());
    }
    #[test]
    fn no_mixing() {
        let mut table = NameTable::new("CELLNAME");
        table.register_implicit(b"A").expect("register failed");
        let err = table.register_explicit(b"B",7).err().expect("should fail");
        assert!(err.contains("mix"));
    }
    #[test]
    fn explicit_collision() {
        let mut table = NameTable::new("PROPNAME");
        table.register_explicit(b"A",7).expect("register failed");
        assert!(table.register_explicit(b"B",7).is_err());
        assert_eq!(table.by_refnum(7).expect("lookup failed").name(),b"A");
    }
    #[test]
    fn intervals() {
        assert!(Interval::All.contains(5));
        assert!(Interval::Range(2,4).contains(3));
        assert!(!Interval::Range(2,4).contains(5));
        assert!(Interval::UpTo(2).contains(0));
        assert!(!Interval::AtLeast(3).contains(2));
    }
}
