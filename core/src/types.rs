//! # Types
//!
//! Shared types: variables, literals with their dependency-graph role, and
//! the working objective of an optimization level.

use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    ops::Not,
};

/// A propositional variable. `0` is reserved for the sentinel literals.
pub type Var = u32;

/// The sign of a literal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

impl Not for Sign {
    type Output = Sign;

    fn not(self) -> Self::Output {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

/// The role a literal plays for the dependency graph. The role determines the
/// sign: the three body roles of negated atoms are negative, the other three
/// are positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Positive body literal whose atom is still undefined (negative sign)
    UndefinedPositiveBody,
    /// Positive body literal whose atom is already true (negative sign)
    TruePositiveBody,
    /// Double-negated body literal (negative sign)
    DoubleNegatedBody,
    /// Negative body literal (positive sign)
    NegativeBody,
    /// Head atom that may still be supported (positive sign)
    PossiblySupportedHead,
    /// Head atom that lost all support (positive sign)
    UnsupportedHead,
}

impl Role {
    pub fn sign(self) -> Sign {
        match self {
            Role::UndefinedPositiveBody | Role::TruePositiveBody | Role::DoubleNegatedBody => {
                Sign::Negative
            }
            Role::NegativeBody | Role::PossiblySupportedHead | Role::UnsupportedHead => {
                Sign::Positive
            }
        }
    }

    /// The role without any dependency-graph information for a given sign
    fn plain(sign: Sign) -> Role {
        match sign {
            Sign::Positive => Role::NegativeBody,
            Sign::Negative => Role::DoubleNegatedBody,
        }
    }
}

/// A literal: a variable, its sign, and its dependency-graph role
///
/// Equality, hashing and ordering only consider variable and sign.
#[derive(Clone, Copy, Debug)]
pub struct Literal {
    var: Var,
    role: Role,
}

impl Literal {
    /// The null literal, used to signal the absence of a literal
    pub const NULL: Literal = Literal {
        var: 0,
        role: Role::NegativeBody,
    };

    /// The conflict literal
    pub const CONFLICT: Literal = Literal {
        var: 0,
        role: Role::DoubleNegatedBody,
    };

    /// Creates a plain literal from a variable and a sign
    pub fn new(var: Var, sign: Sign) -> Self {
        Literal {
            var,
            role: Role::plain(sign),
        }
    }

    /// Creates the positive literal of a variable
    pub fn positive(var: Var) -> Self {
        Self::new(var, Sign::Positive)
    }

    /// Creates the negative literal of a variable
    pub fn negative(var: Var) -> Self {
        Self::new(var, Sign::Negative)
    }

    pub fn new_undefined_positive_body_literal(var: Var) -> Self {
        Literal {
            var,
            role: Role::UndefinedPositiveBody,
        }
    }

    pub fn new_true_positive_body_literal(var: Var) -> Self {
        Literal {
            var,
            role: Role::TruePositiveBody,
        }
    }

    pub fn new_double_negated_body_literal(var: Var) -> Self {
        Literal {
            var,
            role: Role::DoubleNegatedBody,
        }
    }

    pub fn new_negative_body_literal(var: Var) -> Self {
        Literal {
            var,
            role: Role::NegativeBody,
        }
    }

    pub fn new_possibly_supported_head_atom(var: Var) -> Self {
        Literal {
            var,
            role: Role::PossiblySupportedHead,
        }
    }

    pub fn new_unsupported_head_atom(var: Var) -> Self {
        Literal {
            var,
            role: Role::UnsupportedHead,
        }
    }

    /// Parses a signed integer literal id. Returns [`None`] for `0` and for
    /// ids whose variable does not fit a [`Var`].
    pub fn from_id(id: i64) -> Option<Self> {
        let var = Var::try_from(id.unsigned_abs()).ok()?;
        match id.cmp(&0) {
            Ordering::Greater => Some(Self::positive(var)),
            Ordering::Less => Some(Self::negative(var)),
            Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn var(&self) -> Var {
        self.var
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Gets the sign of the literal
    ///
    /// # Panics
    ///
    /// In debug builds, if called on one of the sentinel literals.
    #[inline]
    pub fn sign(&self) -> Sign {
        debug_assert!(self.var != 0, "sign of a sentinel literal");
        self.role.sign()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.sign() == Sign::Positive
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.sign() == Sign::Negative
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Literal::NULL
    }

    #[inline]
    pub fn is_conflict(&self) -> bool {
        *self == Literal::CONFLICT
    }

    /// The complementary literal. It carries no dependency-graph role.
    #[inline]
    pub fn opposite(&self) -> Literal {
        Literal {
            var: self.var,
            role: Role::plain(!self.role.sign()),
        }
    }

    /// The signed integer representation, `+v` or `-v`. Every [`Var`] fits
    /// without loss.
    #[inline]
    pub fn id(&self) -> i64 {
        let var = i64::from(self.var);
        match self.role.sign() {
            Sign::Positive => var,
            Sign::Negative => -var,
        }
    }

    /// A dense index suitable for per-literal tables
    #[inline]
    pub fn index(&self) -> usize {
        let sign = match self.role.sign() {
            Sign::Positive => 0,
            Sign::Negative => 1,
        };
        ((self.var as usize) << 1) | sign
    }

    pub fn set_variable(&mut self, var: Var) {
        self.var = var;
    }

    /// Makes the literal positive, keeping the dependency-graph information
    pub fn set_positive(&mut self) {
        self.role = match self.role {
            Role::UndefinedPositiveBody => Role::PossiblySupportedHead,
            Role::TruePositiveBody => Role::UnsupportedHead,
            Role::DoubleNegatedBody => Role::NegativeBody,
            role => role,
        }
    }

    pub fn is_undefined_positive_body_literal(&self) -> bool {
        self.role == Role::UndefinedPositiveBody
    }

    pub fn is_true_positive_body_literal(&self) -> bool {
        self.role == Role::TruePositiveBody
    }

    pub fn is_double_negated_body_literal(&self) -> bool {
        self.role == Role::DoubleNegatedBody
    }

    pub fn is_negative_body_literal(&self) -> bool {
        self.role == Role::NegativeBody
    }

    pub fn is_possibly_supported_head_atom(&self) -> bool {
        self.role == Role::PossiblySupportedHead
    }

    pub fn is_unsupported_head_atom(&self) -> bool {
        self.role == Role::UnsupportedHead
    }

    pub fn is_head_atom(&self) -> bool {
        matches!(
            self.role,
            Role::PossiblySupportedHead | Role::UnsupportedHead
        )
    }

    pub fn is_positive_body_literal(&self) -> bool {
        matches!(
            self.role,
            Role::UndefinedPositiveBody | Role::TruePositiveBody
        )
    }

    pub fn is_to_be_removed(&self) -> bool {
        matches!(self.role, Role::TruePositiveBody | Role::UnsupportedHead)
    }

    /// Marks a possibly supported head atom as unsupported. This transition is
    /// one-way.
    pub fn set_unsupported_head_atom(&mut self) {
        assert!(self.is_possibly_supported_head_atom());
        self.role = Role::UnsupportedHead;
        assert!(self.is_unsupported_head_atom());
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        self.opposite()
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.var == other.var && self.role.sign() == other.role.sign()
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index().hash(state);
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index().cmp(&other.index())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// An entry of the working objective
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjEntry {
    /// The literal that incurs the cost when true
    pub lit: Literal,
    /// The residual weight
    pub weight: u64,
    /// Whether the literal is one of the level's original optimization literals
    pub original: bool,
}

/// The working objective of a level: the original optimization literals plus
/// the outputs introduced by core relaxation, with residual weights
#[derive(Clone, Debug, Default)]
pub struct Objective {
    entries: Vec<ObjEntry>,
    lookup: HashMap<Literal, usize>,
}

impl Objective {
    /// Initializes the working objective from a level's optimization literals
    pub fn new(lits: &[(Literal, u64)]) -> Self {
        let mut obj = Objective::default();
        for &(lit, weight) in lits {
            obj.insert(lit, weight, true);
        }
        obj
    }

    /// Adds an output literal to the objective
    pub fn push(&mut self, lit: Literal, weight: u64) {
        self.insert(lit, weight, false);
    }

    fn insert(&mut self, lit: Literal, weight: u64, original: bool) {
        if let Some(&idx) = self.lookup.get(&lit) {
            self.entries[idx].weight += weight;
            return;
        }
        self.lookup.insert(lit, self.entries.len());
        self.entries.push(ObjEntry {
            lit,
            weight,
            original,
        });
    }

    /// Finds the entry for which `assump` is the assumption
    pub fn entry_of_assumption(&self, assump: Literal) -> Option<usize> {
        self.lookup.get(&!assump).copied()
    }

    pub fn get(&self, idx: usize) -> &ObjEntry {
        &self.entries[idx]
    }

    /// Decreases the weight of an entry by a value no larger than its weight
    pub fn decrease(&mut self, idx: usize, by: u64) {
        debug_assert!(self.entries[idx].weight >= by);
        self.entries[idx].weight -= by;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjEntry> {
        self.entries.iter()
    }

    /// Iterates over the entries with non-zero residual weight
    pub fn active(&self) -> impl Iterator<Item = &ObjEntry> {
        self.entries.iter().filter(|e| e.weight > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Literal, Objective, Role, Sign};

    #[test]
    fn plain_roles() {
        let pos = Literal::new(3, Sign::Positive);
        let neg = Literal::new(3, Sign::Negative);
        assert!(pos.is_negative_body_literal());
        assert!(neg.is_double_negated_body_literal());
        assert_eq!(pos.id(), 3);
        assert_eq!(neg.id(), -3);
        assert_eq!(pos.index(), 6);
        assert_eq!(neg.index(), 7);
    }

    #[test]
    fn equality_ignores_role() {
        let a = Literal::new_undefined_positive_body_literal(5);
        let b = Literal::new_true_positive_body_literal(5);
        let c = Literal::negative(5);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, Literal::positive(5));
        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn opposite_is_plain() {
        let head = Literal::new_possibly_supported_head_atom(2);
        let opp = head.opposite();
        assert_eq!(opp.role(), Role::DoubleNegatedBody);
        assert_eq!(opp.id(), -2);
        assert_eq!(opp.opposite(), head);
        assert_eq!(!head, opp);
    }

    #[test]
    fn sentinels() {
        assert_ne!(Literal::NULL, Literal::CONFLICT);
        assert!(Literal::NULL.is_null());
        assert!(Literal::CONFLICT.is_conflict());
        assert_ne!(Literal::NULL, Literal::positive(1));
        assert!(!Literal::negative(1).is_null());
    }

    #[test]
    fn set_positive_keeps_flags() {
        let mut l = Literal::new_undefined_positive_body_literal(4);
        l.set_positive();
        assert!(l.is_possibly_supported_head_atom());
        let mut l = Literal::new_true_positive_body_literal(4);
        l.set_positive();
        assert!(l.is_unsupported_head_atom());
        assert!(l.is_to_be_removed());
        let mut l = Literal::new_double_negated_body_literal(4);
        l.set_positive();
        assert!(l.is_negative_body_literal());
    }

    #[test]
    fn role_predicates() {
        let upb = Literal::new_undefined_positive_body_literal(1);
        let tpb = Literal::new_true_positive_body_literal(1);
        let nb = Literal::new_negative_body_literal(1);
        let uh = Literal::new_unsupported_head_atom(1);
        assert!(upb.is_positive_body_literal() && tpb.is_positive_body_literal());
        assert!(!nb.is_positive_body_literal());
        assert!(uh.is_head_atom() && !uh.is_positive_body_literal());
        assert!(tpb.is_to_be_removed() && !upb.is_to_be_removed());
        assert!(upb.is_negative() && uh.is_positive());
    }

    #[test]
    fn unsupported_transition() {
        let mut head = Literal::new_possibly_supported_head_atom(9);
        head.set_unsupported_head_atom();
        assert!(head.is_unsupported_head_atom());
        assert!(head.is_head_atom());
    }

    #[test]
    #[should_panic]
    fn unsupported_transition_is_one_way() {
        let mut body = Literal::new_negative_body_literal(9);
        body.set_unsupported_head_atom();
    }

    #[test]
    fn from_id() {
        assert_eq!(Literal::from_id(4), Some(Literal::positive(4)));
        assert_eq!(Literal::from_id(-4), Some(Literal::negative(4)));
        assert_eq!(Literal::from_id(0), None);
        assert_eq!(format!("{}", Literal::negative(12)), "-12");
    }

    #[test]
    fn large_variables_keep_their_id() {
        let var = u32::MAX;
        assert_eq!(Literal::positive(var).id(), i64::from(var));
        assert_eq!(Literal::negative(var).id(), -i64::from(var));
        assert_eq!(format!("{}", Literal::negative(var)), "-4294967295");
        assert_eq!(
            Literal::from_id(Literal::negative(var).id()),
            Some(Literal::negative(var))
        );
        assert_eq!(Literal::from_id(i64::from(var) + 1), None);
        assert_eq!(Literal::from_id(i64::MIN), None);
    }

    #[test]
    fn objective_merges_and_looks_up() {
        let mut obj = Objective::new(&[(Literal::positive(1), 3), (Literal::negative(2), 2)]);
        obj.push(Literal::positive(1), 1);
        obj.push(Literal::positive(7), 5);
        assert_eq!(obj.len(), 3);
        assert_eq!(obj.get(0).weight, 4);
        assert!(obj.get(0).original);
        assert!(!obj.get(2).original);
        assert_eq!(obj.entry_of_assumption(Literal::positive(2)), Some(1));
        assert_eq!(obj.entry_of_assumption(Literal::positive(1)), None);
        obj.decrease(1, 2);
        assert_eq!(obj.active().count(), 2);
    }
}
