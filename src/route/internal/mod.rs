pub(crate) mod radix_tree;
