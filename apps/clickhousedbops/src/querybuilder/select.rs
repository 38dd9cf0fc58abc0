use super::{backtick, quote, QueryBuilder, QueryBuilderError, Where};

/// A selected column, optionally converted with `toString()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    to_string: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            to_string: false,
        }
    }

    /// Renders ``toString(`name`) AS `name` `` so UUID and array columns come
    /// back as plain strings.
    pub fn to_string_fn(mut self) -> Self {
        self.to_string = true;
        self
    }

    fn sql(&self) -> String {
        if self.to_string {
            format!(
                "toString({}) AS {}",
                backtick(&self.name),
                backtick(&self.name)
            )
        } else {
            backtick(&self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Select {
    fields: Vec<Field>,
    from: String,
    cluster_name: Option<String>,
    wheres: Vec<Where>,
    order_by: Option<(Field, Order)>,
}

impl Select {
    pub fn new(fields: Vec<Field>, from: impl Into<String>) -> Self {
        Self {
            fields,
            from: from.into(),
            cluster_name: None,
            wheres: Vec::new(),
            order_by: None,
        }
    }

    /// Reads from every replica of the cluster with `clusterAllReplicas`.
    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = cluster_name.map(str::to_string);
        self
    }

    pub fn where_(mut self, clauses: impl IntoIterator<Item = Where>) -> Self {
        self.wheres.extend(clauses);
        self
    }

    pub fn order_by(mut self, field: Field, order: Order) -> Self {
        self.order_by = Some((field, order));
        self
    }
}

impl QueryBuilder for Select {
    fn build(&self) -> Result<String, QueryBuilderError> {
        if self.fields.is_empty() {
            return Err(QueryBuilderError::MissingClause {
                statement: "SELECT",
                what: "field",
            });
        }
        if self.from.is_empty() {
            return Err(QueryBuilderError::EmptyResourceName {
                statement: "SELECT",
            });
        }

        let fields = self
            .fields
            .iter()
            .map(Field::sql)
            .collect::<Vec<_>>()
            .join(", ");

        // `from` is a fixed system table name chosen by the caller, not user input.
        let from = match &self.cluster_name {
            Some(cluster) => format!("clusterAllReplicas({}, {})", quote(cluster), self.from),
            None => self.from.clone(),
        };

        let mut sql = format!("SELECT {fields} FROM {from}");

        if !self.wheres.is_empty() {
            let clauses = self
                .wheres
                .iter()
                .map(Where::clause)
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&clauses);
        }

        if let Some((field, order)) = &self.order_by {
            sql.push_str(&format!(" ORDER BY {} {}", backtick(&field.name), order.as_str()));
        }

        sql.push(';');
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let sql = Select::new(vec![Field::new("name")], "system.users")
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT `name` FROM system.users;");
    }

    #[test]
    fn test_select_to_string_with_where() {
        let sql = Select::new(vec![Field::new("id").to_string_fn()], "system.users")
            .where_([Where::equals("name", "john")])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT toString(`id`) AS `id` FROM system.users WHERE `name` = 'john';"
        );
    }

    #[test]
    fn test_select_on_cluster_with_multiple_wheres_and_order() {
        let sql = Select::new(
            vec![Field::new("inherit_profile")],
            "system.settings_profile_elements",
        )
        .with_cluster(Some("cluster1"))
        .where_([
            Where::equals("profile_name", "p1"),
            Where::differs("inherit_profile", None::<String>),
        ])
        .order_by(Field::new("index"), Order::Asc)
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "SELECT `inherit_profile` FROM clusterAllReplicas('cluster1', system.settings_profile_elements) \
             WHERE `profile_name` = 'p1' AND `inherit_profile` IS NOT NULL ORDER BY `index` ASC;"
        );
    }

    #[test]
    fn test_select_without_fields_fails() {
        let err = Select::new(vec![], "system.users").build().unwrap_err();
        assert_eq!(
            err,
            QueryBuilderError::MissingClause {
                statement: "SELECT",
                what: "field"
            }
        );
    }

    #[test]
    fn test_select_without_source_fails() {
        assert!(Select::new(vec![Field::new("name")], "").build().is_err());
    }
}
