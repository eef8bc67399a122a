use std::fmt;

/// XPath navigation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Child,
    Parent,
    Attribute,
    Namespace,
    Descendant,
    DescendantOrSelf,
    Ancestor,
    AncestorOrSelf,
    Following,
    FollowingSibling,
    Preceding,
    PrecedingSibling,
    /// The `self` axis.
    Self_,
}

impl Axis {
    /// All axes.
    pub const ALL: [Axis; 13] = [
        Axis::Child,
        Axis::Parent,
        Axis::Attribute,
        Axis::Namespace,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Ancestor,
        Axis::AncestorOrSelf,
        Axis::Following,
        Axis::FollowingSibling,
        Axis::Preceding,
        Axis::PrecedingSibling,
        Axis::Self_,
    ];

    /// The axis for an XPath axis name such as `preceding-sibling`.
    ///
    /// ```rust
    /// use xdtm::Axis;
    ///
    /// assert_eq!(Axis::from_name("descendant-or-self"), Some(Axis::DescendantOrSelf));
    /// assert_eq!(Axis::from_name("sideways"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|axis| axis.name() == name)
    }

    /// The XPath name of the axis.
    pub fn name(self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Parent => "parent",
            Axis::Attribute => "attribute",
            Axis::Namespace => "namespace",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Following => "following",
            Axis::FollowingSibling => "following-sibling",
            Axis::Preceding => "preceding",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Self_ => "self",
        }
    }

    /// Whether the axis yields nodes in reverse document order.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Axis::from_name(s).ok_or_else(|| format!("unknown axis: {}", s))
    }
}
