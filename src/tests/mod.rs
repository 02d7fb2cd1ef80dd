mod test_recommend;
