use smol_str::SmolStr;

/// One unit of the print stream. The emitter walks the tree producing
/// these; the line printer turns them into text. Containers nest and
/// carry the structure the printer needs for indentation and line
/// breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlToken {
    Keyword(SmolStr),
    Value(SmolStr),
    Operator(SmolStr),
    Parenthesis(SmolStr),
    Comma,
    Dot,
    /// Separates VALUES rows and other argument-level groupings.
    ArgumentSplitter(SmolStr),
    Space,
    Parameter(SmolStr),
    /// A finished comment, delimiters included.
    Comment(SmolStr),
    /// A newline that exists only to position a comment. Real in
    /// multiline output, dropped by the oneliner.
    CommentNewline,
    Container(ContainerType, Vec<SqlToken>),
}

impl SqlToken {
    pub fn keyword(text: &str) -> SqlToken {
        SqlToken::Keyword(SmolStr::new(text))
    }

    pub fn value(text: impl Into<SmolStr>) -> SqlToken {
        SqlToken::Value(text.into())
    }

    /// The raw text of this token, containers flattened.
    pub fn flat_text(&self) -> String {
        match self {
            SqlToken::Keyword(t)
            | SqlToken::Value(t)
            | SqlToken::Operator(t)
            | SqlToken::Parenthesis(t)
            | SqlToken::ArgumentSplitter(t)
            | SqlToken::Parameter(t)
            | SqlToken::Comment(t) => t.to_string(),
            SqlToken::Comma => ",".to_string(),
            SqlToken::Dot => ".".to_string(),
            SqlToken::Space => " ".to_string(),
            SqlToken::CommentNewline => String::new(),
            SqlToken::Container(_, children) => {
                children.iter().map(SqlToken::flat_text).collect()
            }
        }
    }
}

/// Container kinds. Two orthogonal roles: the printer keys indentation
/// and breaking off them, and a fixed subset marks nodes whose
/// positioned-comment list is consumed at emission so a later generic
/// visit cannot re-render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    SimpleSelectQuery,
    BinarySelectQuery,
    SetOperator,
    ValuesQuery,
    ValuesRow,
    WithClause,
    CommonTable,
    SelectClause,
    SelectItem,
    DistinctOn,
    FromClause,
    JoinClause,
    SourceExpression,
    SourceAliasExpression,
    SubQuerySource,
    WhereClause,
    GroupByClause,
    HavingClause,
    WindowClause,
    OrderByClause,
    OrderByItem,
    LimitClause,
    OffsetClause,
    FetchClause,
    ForClause,
    ReturningClause,
    SetClause,
    SetItem,
    UsingClause,
    InsertQuery,
    UpdateQuery,
    DeleteQuery,
    MergeQuery,
    MergeWhenClause,
    CaseExpression,
    SwitchCaseArgument,
    CaseKeyValuePair,
    ParenExpression,
    FunctionCall,
    LiteralValue,
    IdentifierString,
    InlineQuery,
    TypeDefinition,
    ColumnDefinition,
    TableConstraint,
    SequenceOptionList,
}

impl ContainerType {
    /// Containers that drain the node's positioned-comment list when
    /// they emit it.
    pub fn consumes_comments(self) -> bool {
        matches!(
            self,
            ContainerType::CaseExpression
                | ContainerType::SwitchCaseArgument
                | ContainerType::CaseKeyValuePair
                | ContainerType::SelectClause
                | ContainerType::LiteralValue
                | ContainerType::IdentifierString
                | ContainerType::DistinctOn
                | ContainerType::SourceAliasExpression
                | ContainerType::SimpleSelectQuery
                | ContainerType::WhereClause
        )
    }

    /// Clause containers start a fresh line in multiline mode.
    pub fn starts_line(self) -> bool {
        matches!(
            self,
            ContainerType::WithClause
                | ContainerType::SelectClause
                | ContainerType::FromClause
                | ContainerType::JoinClause
                | ContainerType::WhereClause
                | ContainerType::GroupByClause
                | ContainerType::HavingClause
                | ContainerType::WindowClause
                | ContainerType::OrderByClause
                | ContainerType::LimitClause
                | ContainerType::OffsetClause
                | ContainerType::FetchClause
                | ContainerType::ForClause
                | ContainerType::ReturningClause
                | ContainerType::SetClause
                | ContainerType::UsingClause
                | ContainerType::MergeWhenClause
                | ContainerType::SetOperator
        )
    }

    /// List items indent one level under their clause and start their
    /// own line in multiline mode.
    pub fn is_list_item(self) -> bool {
        matches!(
            self,
            ContainerType::SelectItem
                | ContainerType::OrderByItem
                | ContainerType::SetItem
                | ContainerType::CommonTable
                | ContainerType::ValuesRow
                | ContainerType::ColumnDefinition
                | ContainerType::TableConstraint
        )
    }

    /// Subtrees whose clause lines sit one level deeper.
    pub fn indents(self) -> bool {
        matches!(
            self,
            ContainerType::SubQuerySource | ContainerType::InlineQuery
        )
    }
}
