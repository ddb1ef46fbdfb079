//! Structural tree: the typed view of parsed SQL the analyzers work on.
//!
//! Parsing produces sqlparser statements; a single visitor pass flattens them
//! into typed nodes, indexed by kind, so that "find every node of kind K"
//! is a slice lookup instead of a repeated tree walk.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use serde::Serialize;
use sqlparser::ast::{
    visit_expressions, AssignmentTarget, BinaryOperator, CastKind, Expr, FunctionArg,
    FunctionArgExpr, FunctionArguments, JoinConstraint, JoinOperator, ObjectName, Query, Select,
    SelectItem, SetExpr, Statement, TableAlias, TableFactor, TableWithJoins, Visit, Visitor,
};

use super::dialect::{is_date_part, SqlDialect};
use super::ident_extract::{column_from_expr, from_object_name, object_name_parts};

/// How a parse attempt concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// The requested dialect (`None` = generic grammar) accepted the text
    Clean { dialect: Option<SqlDialect> },
    /// The requested dialect failed and a fallback grammar accepted the text
    Fallback { dialect: Option<SqlDialect> },
    /// Nothing parsed cleanly; the tree is a best-effort salvage
    Degraded,
}

impl ParseOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ParseOutcome::Degraded)
    }

    /// The grammar that ultimately succeeded, if any
    pub fn dialect(&self) -> Option<SqlDialect> {
        match self {
            ParseOutcome::Clean { dialect } | ParseOutcome::Fallback { dialect } => *dialect,
            ParseOutcome::Degraded => None,
        }
    }
}

/// A referenced table: name parts in catalog, schema, table order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub parts: Vec<String>,
}

impl TableRef {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// The bare (last segment) table name
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// catalog.schema.table as written
    pub fn qualified(&self) -> String {
        self.parts.join(".")
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }
}

/// A referenced column with its optional table qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub name: String,
    pub table: Option<String>,
}

impl ColumnRef {
    /// `table.column` when qualified, else `column`
    pub fn qualified(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    /// Upper-cased SQL surface name
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasKind {
    /// `FROM orders o`
    Table,
    /// `SELECT total AS amount`
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasBinding {
    pub alias: String,
    /// Bare table name, column name or expression text
    pub target: String,
    pub kind: AliasKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Semi,
    Anti,
    Apply,
    AsOf,
    Other,
}

/// Operand of an equality comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Column(ColumnRef),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Equality {
    pub left: Operand,
    pub right: Operand,
}

impl Equality {
    /// Both operands as column references, when they are
    pub fn column_pair(&self) -> Option<(&ColumnRef, &ColumnRef)> {
        match (&self.left, &self.right) {
            (Operand::Column(l), Operand::Column(r)) => Some((l, r)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinNode {
    pub kind: JoinKind,
    /// The joined relation when it is a plain table
    pub table: Option<TableRef>,
    /// Whether the join has an ON clause
    pub has_on: bool,
    /// Equality comparisons found anywhere in the ON clause
    pub conditions: Vec<Equality>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Table(TableRef),
    Column(ColumnRef),
    Function(FunctionCall),
    Alias(AliasBinding),
    Join(JoinNode),
    Equality(Equality),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Table(_) => NodeKind::Table,
            Node::Column(_) => NodeKind::Column,
            Node::Function(_) => NodeKind::Function,
            Node::Alias(_) => NodeKind::Alias,
            Node::Join(_) => NodeKind::Join,
            Node::Equality(_) => NodeKind::Equality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Table,
    Column,
    Function,
    Alias,
    Join,
    Equality,
}

/// Parsed SQL with its kind-indexed node list
#[derive(Debug, Clone)]
pub struct StructuralTree {
    statements: Vec<Statement>,
    nodes: Vec<Node>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
    derived: Vec<String>,
    outcome: ParseOutcome,
}

impl StructuralTree {
    /// Build a tree from parsed statements plus any salvaged nodes
    pub(crate) fn build(
        statements: Vec<Statement>,
        salvaged: Vec<Node>,
        outcome: ParseOutcome,
    ) -> Self {
        let mut collector = NodeCollector::default();
        for statement in &statements {
            let _ = statement.visit(&mut collector);
        }
        collector.nodes.extend(salvaged);
        let (nodes, derived) = collector.finish();

        let mut by_kind: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            by_kind.entry(node.kind()).or_default().push(idx);
        }

        Self {
            statements,
            nodes,
            by_kind,
            derived,
            outcome,
        }
    }

    /// Every node of `kind`, in discovery order
    pub fn find_all(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.by_kind
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&idx| &self.nodes[idx])
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableRef> + '_ {
        self.find_all(NodeKind::Table).filter_map(|n| match n {
            Node::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> + '_ {
        self.find_all(NodeKind::Column).filter_map(|n| match n {
            Node::Column(c) => Some(c),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionCall> + '_ {
        self.find_all(NodeKind::Function).filter_map(|n| match n {
            Node::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn aliases(&self) -> impl Iterator<Item = &AliasBinding> + '_ {
        self.find_all(NodeKind::Alias).filter_map(|n| match n {
            Node::Alias(a) => Some(a),
            _ => None,
        })
    }

    pub fn joins(&self) -> impl Iterator<Item = &JoinNode> + '_ {
        self.find_all(NodeKind::Join).filter_map(|n| match n {
            Node::Join(j) => Some(j),
            _ => None,
        })
    }

    pub fn equalities(&self) -> impl Iterator<Item = &Equality> + '_ {
        self.find_all(NodeKind::Equality).filter_map(|n| match n {
            Node::Equality(e) => Some(e),
            _ => None,
        })
    }

    /// Table aliases mapped (lower-cased alias) to bare table name
    pub fn table_aliases(&self) -> HashMap<String, String> {
        self.aliases()
            .filter(|a| a.kind == AliasKind::Table)
            .map(|a| (a.alias.to_lowercase(), a.target.clone()))
            .collect()
    }

    /// CTE names and derived-table aliases
    pub fn derived_relations(&self) -> &[String] {
        &self.derived
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn outcome(&self) -> ParseOutcome {
        self.outcome
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Visitor that flattens sqlparser statements into typed nodes
#[derive(Default)]
struct NodeCollector {
    nodes: Vec<Node>,
    cte_names: HashSet<String>,
    derived: Vec<String>,
    /// Names used as table-valued functions in FROM (lower-cased, qualified)
    table_functions: HashSet<String>,
    /// Unit keywords passed to date functions (`DATEDIFF(day, ...)`), by address
    unit_arguments: HashSet<*const Expr>,
}

impl NodeCollector {
    /// Drop table references that are really CTEs or table functions
    fn finish(self) -> (Vec<Node>, Vec<String>) {
        let NodeCollector {
            nodes,
            cte_names,
            derived,
            table_functions,
            ..
        } = self;

        let nodes = nodes
            .into_iter()
            .filter(|node| match node {
                Node::Table(t) => {
                    let is_cte = !t.is_qualified() && cte_names.contains(&t.name().to_lowercase());
                    !is_cte && !table_functions.contains(&t.qualified().to_lowercase())
                }
                _ => true,
            })
            .collect();
        (nodes, derived)
    }

    fn push_derived(&mut self, name: &str) {
        if !self.derived.iter().any(|d| d.eq_ignore_ascii_case(name)) {
            self.derived.push(name.to_string());
        }
    }

    /// Register the alias of a non-table relation and its column list.
    ///
    /// UNNEST and table functions yield a value column named after the alias
    /// itself, so `target` also binds the alias name; subqueries pass `None`.
    fn bind_relation_alias(&mut self, alias: &TableAlias, target: Option<String>) {
        self.push_derived(&alias.name.value);
        for column in &alias.columns {
            self.nodes.push(Node::Alias(AliasBinding {
                alias: column.name.value.clone(),
                target: format!("{}.{}", alias.name.value, column.name.value),
                kind: AliasKind::Expression,
            }));
        }
        if let Some(target) = target {
            self.nodes.push(Node::Alias(AliasBinding {
                alias: alias.name.value.clone(),
                target,
                kind: AliasKind::Expression,
            }));
        }
    }

    /// Remember bare date-part keywords among a date function's arguments
    fn mark_unit_arguments(&mut self, name: &str, args: &FunctionArguments) {
        if !(name.contains("DATE") || name.contains("TIME")) {
            return;
        }
        let FunctionArguments::List(list) = args else {
            return;
        };
        for arg in &list.args {
            let FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) = arg else {
                continue;
            };
            if let Expr::Identifier(ident) = expr {
                if ident.quote_style.is_none() && is_date_part(&ident.value) {
                    self.unit_arguments.insert(expr as *const Expr);
                }
            }
        }
    }

    /// `SET col = ...` or `SET t.col = ...`
    fn push_target_column(&mut self, name: &ObjectName) {
        let parts = object_name_parts(name);
        if let Some((column, qualifiers)) = parts.split_last() {
            self.nodes.push(Node::Column(ColumnRef {
                name: column.clone(),
                table: qualifiers.last().cloned(),
            }));
        }
    }

    /// Walk a query body for projection aliases and joins.
    ///
    /// Nested `SetExpr::Query` bodies are skipped: the visitor reaches them
    /// through `pre_visit_query` on its own.
    fn collect_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => self.collect_select(select),
            SetExpr::SetOperation { left, right, .. } => {
                self.collect_set_expr(left);
                self.collect_set_expr(right);
            }
            _ => {}
        }
    }

    fn collect_select(&mut self, select: &Select) {
        for item in &select.projection {
            if let SelectItem::ExprWithAlias { expr, alias } = item {
                let target = column_from_expr(expr).unwrap_or_else(|| expr.to_string());
                self.nodes.push(Node::Alias(AliasBinding {
                    alias: alias.value.clone(),
                    target,
                    kind: AliasKind::Expression,
                }));
            }
        }
        self.collect_joins(&select.from);
    }

    fn collect_joins(&mut self, from: &[TableWithJoins]) {
        for table_with_joins in from {
            for join in &table_with_joins.joins {
                let table = match &join.relation {
                    TableFactor::Table { name, .. } => Some(TableRef::new(object_name_parts(name))),
                    _ => None,
                };
                let (kind, constraint) = join_kind(&join.join_operator);
                let on = match constraint {
                    Some(JoinConstraint::On(expr)) => Some(expr),
                    _ => None,
                };
                let conditions = on.map(equalities_in).unwrap_or_default();
                self.nodes.push(Node::Join(JoinNode {
                    kind,
                    table,
                    has_on: on.is_some(),
                    conditions,
                }));
            }
        }
    }
}

impl Visitor for NodeCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.cte_names.insert(cte.alias.name.value.to_lowercase());
                self.push_derived(&cte.alias.name.value);
            }
        }
        self.collect_set_expr(&query.body);
        ControlFlow::Continue(())
    }

    /// Column targets of UPDATE and INSERT are not reached as expressions
    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        match statement {
            Statement::Update { assignments, .. } => {
                for assignment in assignments {
                    match &assignment.target {
                        AssignmentTarget::ColumnName(name) => self.push_target_column(name),
                        AssignmentTarget::Tuple(names) => {
                            for name in names {
                                self.push_target_column(name);
                            }
                        }
                    }
                }
            }
            Statement::Insert(insert) => {
                for column in &insert.columns {
                    self.nodes.push(Node::Column(ColumnRef {
                        name: column.value.clone(),
                        table: None,
                    }));
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        let parts = object_name_parts(relation);
        if !parts.is_empty() {
            self.nodes.push(Node::Table(TableRef::new(parts)));
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        match table_factor {
            TableFactor::Table {
                name, alias, args, ..
            } => {
                if args.is_some() {
                    let qualified = object_name_parts(name).join(".");
                    self.table_functions.insert(qualified.to_lowercase());
                    self.nodes.push(Node::Function(FunctionCall {
                        name: qualified.to_uppercase(),
                    }));
                    if let Some(alias) = alias {
                        self.bind_relation_alias(alias, Some(qualified));
                    }
                } else if let Some(alias) = alias {
                    self.nodes.push(Node::Alias(AliasBinding {
                        alias: alias.name.value.clone(),
                        target: from_object_name(name),
                        kind: AliasKind::Table,
                    }));
                }
            }
            TableFactor::Function {
                name,
                alias: Some(alias),
                ..
            } => {
                self.bind_relation_alias(alias, Some(object_name_parts(name).join(".")));
            }
            TableFactor::UNNEST {
                alias: Some(alias), ..
            } => {
                self.bind_relation_alias(alias, Some("UNNEST".to_string()));
            }
            TableFactor::TableFunction {
                alias: Some(alias), ..
            } => {
                self.bind_relation_alias(alias, Some("TABLE".to_string()));
            }
            TableFactor::Derived {
                alias: Some(alias), ..
            } => {
                self.bind_relation_alias(alias, None);
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.collect_joins(std::slice::from_ref(table_with_joins.as_ref()));
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Identifier(_) if self.unit_arguments.contains(&(expr as *const Expr)) => {}
            Expr::Identifier(ident) => {
                self.nodes.push(Node::Column(ColumnRef {
                    name: ident.value.clone(),
                    table: None,
                }));
            }
            Expr::CompoundIdentifier(parts) => {
                if let Some((column, qualifiers)) = parts.split_last() {
                    self.nodes.push(Node::Column(ColumnRef {
                        name: column.value.clone(),
                        table: qualifiers.last().map(|q| q.value.clone()),
                    }));
                }
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                self.nodes.push(Node::Equality(Equality {
                    left: operand(left),
                    right: operand(right),
                }));
            }
            _ => {
                if let Some(name) = function_name(expr) {
                    if let Expr::Function(function) = expr {
                        self.mark_unit_arguments(&name, &function.args);
                    }
                    self.nodes.push(Node::Function(FunctionCall { name }));
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Upper-cased surface name of a function-like expression.
///
/// Calls carry their own name; special syntax (CAST, CASE, EXTRACT, ...) is
/// named after the SQL keyword that introduces it.
fn function_name(expr: &Expr) -> Option<String> {
    let name = match expr {
        Expr::Function(function) => {
            return Some(object_name_parts(&function.name).join(".").to_uppercase())
        }
        Expr::Cast { kind, .. } => match kind {
            CastKind::TryCast => "TRY_CAST",
            CastKind::SafeCast => "SAFE_CAST",
            _ => "CAST",
        },
        Expr::Case { .. } => "CASE",
        Expr::Extract { .. } => "EXTRACT",
        Expr::Substring { .. } => "SUBSTRING",
        Expr::Trim { .. } => "TRIM",
        Expr::Position { .. } => "POSITION",
        Expr::Ceil { .. } => "CEIL",
        Expr::Floor { .. } => "FLOOR",
        Expr::Overlay { .. } => "OVERLAY",
        _ => return None,
    };
    Some(name.to_string())
}

fn operand(expr: &Expr) -> Operand {
    match expr {
        Expr::Nested(inner) => operand(inner),
        Expr::Identifier(ident) => Operand::Column(ColumnRef {
            name: ident.value.clone(),
            table: None,
        }),
        Expr::CompoundIdentifier(parts) => match parts.split_last() {
            Some((column, qualifiers)) => Operand::Column(ColumnRef {
                name: column.value.clone(),
                table: qualifiers.last().map(|q| q.value.clone()),
            }),
            None => Operand::Other(expr.to_string()),
        },
        other => Operand::Other(other.to_string()),
    }
}

/// Every `=` comparison anywhere inside an ON clause
fn equalities_in(on: &Expr) -> Vec<Equality> {
    let mut found = Vec::new();
    let _ = visit_expressions(on, |expr| {
        if let Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } = expr
        {
            found.push(Equality {
                left: operand(left),
                right: operand(right),
            });
        }
        ControlFlow::<()>::Continue(())
    });
    found
}

fn join_kind(operator: &JoinOperator) -> (JoinKind, Option<&JoinConstraint>) {
    match operator {
        JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
        JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
        JoinOperator::RightOuter(c) => (JoinKind::Right, Some(c)),
        JoinOperator::FullOuter(c) => (JoinKind::Full, Some(c)),
        JoinOperator::CrossJoin => (JoinKind::Cross, None),
        JoinOperator::LeftSemi(c) | JoinOperator::RightSemi(c) => (JoinKind::Semi, Some(c)),
        JoinOperator::LeftAnti(c) | JoinOperator::RightAnti(c) => (JoinKind::Anti, Some(c)),
        JoinOperator::CrossApply | JoinOperator::OuterApply => (JoinKind::Apply, None),
        JoinOperator::AsOf { constraint, .. } => (JoinKind::AsOf, Some(constraint)),
        #[allow(unreachable_patterns)]
        _ => (JoinKind::Other, None),
    }
}
