use crate::error::{Error, Result};
use libxml::parser::Parser;
use libxml::tree::{self, Document, NodeType};
use libxml::xpath::Context;
use std::{fmt, ops::Deref, rc::Rc};

#[derive(Debug)]
pub enum Value {
    Element(Vec<Node>),
    Text(Vec<String>),
    None,
}

#[derive(Clone)]
pub struct Node {
    _document: Rc<Document>,
    context: Rc<Context>,
    node: tree::Node,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get_type() {
            Some(NodeType::ElementNode) => {
                write!(f, "<Element {} at {:p}>", self.get_name(), self.node_ptr())
            }
            Some(NodeType::AttributeNode) | Some(NodeType::TextNode) => {
                write!(f, "{:?}", self.get_content())
            }
            other => write!(f, "<{:?}>", other),
        }
    }
}

/// 生成匹配 class 的 XPath 谓词，等价于 CSS 的 `.name`
pub fn has_class(name: &str) -> String {
    format!(
        r#"contains(concat(" ", normalize-space(@class), " "), " {} ")"#,
        name
    )
}

impl Node {
    pub fn xpath_text(&self, xpath: &str) -> Result<Vec<String>> {
        match self.xpath(xpath)? {
            Value::Text(v) => Ok(v),
            Value::None => Ok(vec![]),
            Value::Element(_) => Err(Error::Markup(format!("{} 不是文本节点", xpath))),
        }
    }

    pub fn xpath_elem(&self, xpath: &str) -> Result<Vec<Node>> {
        match self.xpath(xpath)? {
            Value::Element(v) => Ok(v),
            Value::None => Ok(vec![]),
            Value::Text(_) => Err(Error::Markup(format!("{} 不是元素节点", xpath))),
        }
    }

    /// 第一个匹配的元素
    pub fn first_elem(&self, xpath: &str) -> Result<Option<Node>> {
        Ok(self.xpath_elem(xpath)?.into_iter().next())
    }

    /// 第一个匹配的文本或属性值
    pub fn first_text(&self, xpath: &str) -> Result<Option<String>> {
        Ok(self.xpath_text(xpath)?.into_iter().next())
    }

    /// 元素自身的文本（不包括子元素），空白会被合并
    pub fn own_text(&self) -> Result<String> {
        let text = self.xpath_text("./text()")?.join("");
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// 属性值
    pub fn attr(&self, name: &str) -> Option<String> {
        self.node.get_property(name)
    }

    pub fn xpath(&self, xpath: &str) -> Result<Value> {
        let nodes = self
            .context
            .node_evaluate(xpath, &self.node)
            .map_err(|_| Error::Markup(format!("failed to evaluate xpath: {}", xpath)))?
            .get_nodes_as_vec();
        let result = match nodes.get(0).map(|node| node.get_type()) {
            Some(Some(NodeType::ElementNode)) => Value::Element(
                nodes
                    .into_iter()
                    .map(|node| Node {
                        _document: self._document.clone(),
                        context: self.context.clone(),
                        node,
                    })
                    .collect(),
            ),
            Some(Some(NodeType::AttributeNode)) | Some(Some(NodeType::TextNode)) => {
                Value::Text(nodes.into_iter().map(|node| node.get_content()).collect())
            }
            Some(other) => {
                return Err(Error::Markup(format!(
                    "unsupported node type {:?}: {}",
                    other, xpath
                )))
            }
            None => Value::None,
        };
        Ok(result)
    }
}

impl Deref for Node {
    type Target = tree::Node;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

pub fn parse_html<S: AsRef<str>>(html: S) -> Result<Node> {
    let parser = Parser::default_html();
    let document = parser
        .parse_string(html.as_ref())
        .map_err(|_| Error::Markup("failed to parse html".to_owned()))?;
    let context =
        Context::new(&document).map_err(|_| Error::Markup("failed to new context".to_owned()))?;
    let root = document
        .get_root_element()
        .ok_or_else(|| Error::Markup("no root element".to_owned()))?;
    Ok(Node {
        _document: Rc::new(document),
        context: Rc::new(context),
        node: root,
    })
}
