pub mod stopword_keyword_extractor;
