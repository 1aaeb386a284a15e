use smol_str::SmolStr;

use crate::ast::comments::Comments;
use crate::ast::query::{OrderByClause, Query};

/// The closed set of value-expression variants. Every variant owns its
/// children outright; moving a node between trees is a value transfer,
/// so sibling trees can never alias each other.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Literal(LiteralValue),
    Identifier(IdentifierExpr),
    Column(ColumnRef),
    Parameter(ParameterExpr),
    Function(Box<FunctionCall>),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Paren(Box<ParenExpr>),
    Cast(Box<CastExpr>),
    Case(Box<CaseExpr>),
    Between(Box<BetweenExpr>),
    Tuple(TupleExpr),
    ValueList(ValueList),
    InlineQuery(Box<InlineQuery>),
    Array(Box<ArrayExpr>),
    ArrayQuery(Box<ArrayQueryExpr>),
    ArrayIndex(Box<ArrayIndexExpr>),
    ArraySlice(Box<ArraySliceExpr>),
    TypeName(TypeExpr),
    Hint(HintExpr),
}

impl ValueExpr {
    pub fn comments(&self) -> &Comments {
        match self {
            ValueExpr::Literal(n) => &n.comments,
            ValueExpr::Identifier(n) => &n.comments,
            ValueExpr::Column(n) => &n.comments,
            ValueExpr::Parameter(n) => &n.comments,
            ValueExpr::Function(n) => &n.comments,
            ValueExpr::Unary(n) => &n.comments,
            ValueExpr::Binary(n) => &n.comments,
            ValueExpr::Paren(n) => &n.comments,
            ValueExpr::Cast(n) => &n.comments,
            ValueExpr::Case(n) => &n.comments,
            ValueExpr::Between(n) => &n.comments,
            ValueExpr::Tuple(n) => &n.comments,
            ValueExpr::ValueList(n) => &n.comments,
            ValueExpr::InlineQuery(n) => &n.comments,
            ValueExpr::Array(n) => &n.comments,
            ValueExpr::ArrayQuery(n) => &n.comments,
            ValueExpr::ArrayIndex(n) => &n.comments,
            ValueExpr::ArraySlice(n) => &n.comments,
            ValueExpr::TypeName(n) => &n.comments,
            ValueExpr::Hint(n) => &n.comments,
        }
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        match self {
            ValueExpr::Literal(n) => &mut n.comments,
            ValueExpr::Identifier(n) => &mut n.comments,
            ValueExpr::Column(n) => &mut n.comments,
            ValueExpr::Parameter(n) => &mut n.comments,
            ValueExpr::Function(n) => &mut n.comments,
            ValueExpr::Unary(n) => &mut n.comments,
            ValueExpr::Binary(n) => &mut n.comments,
            ValueExpr::Paren(n) => &mut n.comments,
            ValueExpr::Cast(n) => &mut n.comments,
            ValueExpr::Case(n) => &mut n.comments,
            ValueExpr::Between(n) => &mut n.comments,
            ValueExpr::Tuple(n) => &mut n.comments,
            ValueExpr::ValueList(n) => &mut n.comments,
            ValueExpr::InlineQuery(n) => &mut n.comments,
            ValueExpr::Array(n) => &mut n.comments,
            ValueExpr::ArrayQuery(n) => &mut n.comments,
            ValueExpr::ArrayIndex(n) => &mut n.comments,
            ValueExpr::ArraySlice(n) => &mut n.comments,
            ValueExpr::TypeName(n) => &mut n.comments,
            ValueExpr::Hint(n) => &mut n.comments,
        }
    }

    /// The name this expression would surface as in a select list when
    /// it carries no alias: a bare identifier's name or a column
    /// reference's terminal name.
    pub fn output_name(&self) -> Option<&SmolStr> {
        match self {
            ValueExpr::Identifier(n) => Some(&n.name),
            ValueExpr::Column(n) => Some(&n.name),
            ValueExpr::Paren(n) => n.inner.output_name(),
            _ => None,
        }
    }

    pub fn column(name: impl Into<SmolStr>) -> ValueExpr {
        ValueExpr::Column(ColumnRef::new(Vec::new(), name))
    }

    pub fn qualified_column(
        namespaces: impl IntoIterator<Item = SmolStr>,
        name: impl Into<SmolStr>,
    ) -> ValueExpr {
        ValueExpr::Column(ColumnRef::new(namespaces.into_iter().collect(), name))
    }

    pub fn and(self, rhs: ValueExpr) -> ValueExpr {
        ValueExpr::Binary(Box::new(BinaryExpr {
            left: self,
            op: SmolStr::new("and"),
            right: rhs,
            comments: Comments::new(),
        }))
    }

    pub fn equals(self, rhs: ValueExpr) -> ValueExpr {
        ValueExpr::Binary(Box::new(BinaryExpr {
            left: self,
            op: SmolStr::new("="),
            right: rhs,
            comments: Comments::new(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    /// Dollar-quoted text kept verbatim, delimiters included.
    DollarString,
    Number,
    Boolean,
    Null,
    /// Raw keywords rendered as-is (DEFAULT, CURRENT_TIMESTAMP, ...).
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralValue {
    pub value: SmolStr,
    pub kind: LiteralKind,
    pub comments: Comments,
}

impl LiteralValue {
    pub fn new(value: impl Into<SmolStr>, kind: LiteralKind) -> Self {
        LiteralValue {
            value: value.into(),
            kind,
            comments: Comments::new(),
        }
    }

    pub fn is_string(&self) -> bool {
        self.kind == LiteralKind::String
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpr {
    pub name: SmolStr,
    pub comments: Comments,
}

impl IdentifierExpr {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        IdentifierExpr {
            name: name.into(),
            comments: Comments::new(),
        }
    }
}

/// A possibly-qualified column reference: `id`, `u.id`, `s.u.id`, or
/// the wildcard forms `*` and `u.*`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub namespaces: Vec<SmolStr>,
    pub name: SmolStr,
    pub comments: Comments,
}

impl ColumnRef {
    pub fn new(namespaces: Vec<SmolStr>, name: impl Into<SmolStr>) -> Self {
        ColumnRef {
            namespaces,
            name: name.into(),
            comments: Comments::new(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }

    /// The first qualifier, when present. Join-order normalization keys
    /// off this.
    pub fn qualifier(&self) -> Option<&SmolStr> {
        self.namespaces.first()
    }

    /// Qualifier path joined by dots, e.g. `schema.table`.
    pub fn qualifier_path(&self) -> Option<String> {
        if self.namespaces.is_empty() {
            None
        } else {
            Some(self.namespaces.join("."))
        }
    }
}

/// A possibly-qualified object name (table, index, sequence, schema).
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub namespaces: Vec<SmolStr>,
    pub name: SmolStr,
    pub comments: Comments,
}

impl QualifiedName {
    pub fn new(namespaces: Vec<SmolStr>, name: impl Into<SmolStr>) -> Self {
        QualifiedName {
            namespaces,
            name: name.into(),
            comments: Comments::new(),
        }
    }

    pub fn bare(name: impl Into<SmolStr>) -> Self {
        QualifiedName::new(Vec::new(), name)
    }

    /// Full dotted path, namespaces included.
    pub fn path(&self) -> String {
        if self.namespaces.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespaces.join("."), self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterExpr {
    pub name: SmolStr,
    /// Explicit index for `$n`-style parameters. Styles that assign
    /// indices do so during the emit walk, starting at 1.
    pub index: Option<usize>,
    pub value: Option<ParamValue>,
    pub comments: Comments,
}

impl ParameterExpr {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        ParameterExpr {
            name: name.into(),
            index: None,
            value: None,
            comments: Comments::new(),
        }
    }
}

/// A bound parameter value. Mirrors the scalar shapes a driver row
/// would carry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: QualifiedName,
    /// `None` means no argument list at all (`current_date`), which is
    /// distinct from an empty one (`now()`).
    pub args: Option<Vec<ValueExpr>>,
    /// ORDER BY inside the call parentheses (aggregates).
    pub internal_order_by: Option<OrderByClause>,
    pub over: Option<OverClause>,
    pub with_ordinality: bool,
    pub comments: Comments,
}

impl FunctionCall {
    pub fn new(name: QualifiedName, args: Vec<ValueExpr>) -> Self {
        FunctionCall {
            name,
            args: Some(args),
            internal_order_by: None,
            over: None,
            with_ordinality: false,
            comments: Comments::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverClause {
    pub window: OverWindow,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverWindow {
    /// `over w` referencing a named window.
    Name(SmolStr),
    /// `over (partition by ... order by ... frame)`.
    Spec(WindowSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub partition_by: Vec<ValueExpr>,
    pub order_by: Option<OrderByClause>,
    pub frame: Option<WindowFrameSpec>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnit {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(ValueExpr),
    CurrentRow,
    Following(ValueExpr),
    UnboundedFollowing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrameSpec {
    pub unit: FrameUnit,
    pub start: FrameBound,
    /// Present for `between ... and ...` frames.
    pub end: Option<FrameBound>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: SmolStr,
    pub operand: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: ValueExpr,
    pub op: SmolStr,
    pub right: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub inner: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub input: ValueExpr,
    pub ty: TypeExpr,
    pub comments: Comments,
}

/// `case [cond] when ... then ... [else ...] end`. Comments sitting on
/// the `end` keyword get their own slot so emission can place them
/// after the closing keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub condition: Option<ValueExpr>,
    pub switch: SwitchCaseArgument,
    pub end_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCaseArgument {
    pub cases: Vec<CaseKeyValuePair>,
    pub else_value: Option<ValueExpr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseKeyValuePair {
    pub key: ValueExpr,
    pub value: ValueExpr,
    /// Comments between THEN and the value.
    pub then_comments: Vec<SmolStr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpr {
    pub negated: bool,
    pub operand: ValueExpr,
    pub lower: ValueExpr,
    pub upper: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    pub items: Vec<ValueExpr>,
    pub comments: Comments,
}

impl TupleExpr {
    pub fn new(items: Vec<ValueExpr>) -> Self {
        TupleExpr {
            items,
            comments: Comments::new(),
        }
    }
}

/// A bare comma list, as in `x in (a, b, c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    pub items: Vec<ValueExpr>,
    pub comments: Comments,
}

/// A scalar or row subquery in expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineQuery {
    pub query: Query,
    pub comments: Comments,
}

/// `array[a, b, c]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub items: Vec<ValueExpr>,
    pub comments: Comments,
}

/// `array(select ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayQueryExpr {
    pub query: Query,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayIndexExpr {
    pub base: ValueExpr,
    pub index: ValueExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySliceExpr {
    pub base: ValueExpr,
    pub lower: Option<ValueExpr>,
    pub upper: Option<ValueExpr>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: SmolStr,
    /// Precision/scale arguments, e.g. `numeric(10, 2)`.
    pub args: Option<Vec<ValueExpr>>,
    pub comments: Comments,
}

impl TypeExpr {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        TypeExpr {
            name: name.into(),
            args: None,
            comments: Comments::new(),
        }
    }
}

/// An optimizer hint block following SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct HintExpr {
    pub text: SmolStr,
    pub comments: Comments,
}
